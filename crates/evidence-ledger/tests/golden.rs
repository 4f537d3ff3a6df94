//! End-to-end tests over a real directory tree.
//!
//! Every implementation of the ledger must produce identical:
//! - scope_manifest_sha
//! - merkle_root
//! - final_chain_hash
//!
//! for the golden scopes in `evidence_ledger_testkit::vectors`, and must
//! refuse to pass when any anchor is missing or altered.

use evidence_ledger::core::{leaf_hash, verify_inclusion, MerkleRoot, RuleSet, ScopeRule, ScopeSpec};
use evidence_ledger::{
    Anchors, CheckId, FindingKind, IntegrityDocument, LedgerConfig, LedgerDocument, ReasonCode,
    Verdict,
};
use evidence_ledger_testkit::fixtures::{context_at, fixed_context, sample_reports, TreeFixture};
use evidence_ledger_testkit::generators::{evidence_tree, report_text};
use evidence_ledger_testkit::vectors::all_vectors;
use evidence_ledger_testkit::memory_ledger;
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("evidence_ledger=debug")
        .with_test_writer()
        .try_init();
}

const MERKLE: &str = "reports/ledger/MERKLE_ROOT.md";
const CHECKSUMS: &str = "reports/ledger/CHECKSUMS.md";
const CHAIN: &str = "reports/ledger/RECEIPT_CHAIN.md";

fn root_config() -> LedgerConfig {
    LedgerConfig {
        scope: ScopeSpec::new().rule(ScopeRule::new(".")),
        ..LedgerConfig::default()
    }
}

fn f123() -> TreeFixture {
    TreeFixture::with_config(&[("f1", "x\n"), ("f2", "y\n"), ("f3", "z\n")], root_config()).unwrap()
}

/// Replace the last hex character of the `key:` line in `path`.
fn alter_anchor(fixture: &TreeFixture, path: &str, key: &str) {
    let text = fixture.read_text(path).unwrap();
    let altered: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with(key) {
                let mut line = line.to_string();
                let last = if line.ends_with('0') { '1' } else { '0' };
                line.pop();
                line.push(last);
                line
            } else {
                line.to_string()
            }
        })
        .collect();
    fixture
        .write(path, format!("{}\n", altered.join("\n")).as_bytes())
        .unwrap();
}

#[test]
fn golden_vectors_through_the_ledger() {
    for vector in all_vectors() {
        let store = vector.store().unwrap();
        let ledger = evidence_ledger::Ledger::new(store, root_config()).unwrap();
        let snapshot = ledger.snapshot().unwrap();
        assert_eq!(
            snapshot.aggregate(CheckId::ScopeManifestSha),
            vector.scope_manifest_sha,
            "{}",
            vector.name
        );
        assert_eq!(snapshot.aggregate(CheckId::MerkleRoot), vector.merkle_root, "{}", vector.name);
        assert_eq!(
            snapshot.aggregate(CheckId::FinalChainHash),
            vector.final_chain_hash,
            "{}",
            vector.name
        );
    }
}

#[test]
fn end_to_end_pass_with_fresh_anchors() -> anyhow::Result<()> {
    init_tracing();
    let fixture = f123();
    let ctx = fixed_context();
    let snapshot = fixture.ledger.anchor(&ctx)?;

    assert_eq!(
        snapshot.aggregate(CheckId::ScopeManifestSha),
        "4810de467a5efb444e2103bef85548fb3b0a6fb9d8c7799367c0942de3b37e33"
    );

    let report = fixture.ledger.verify_and_record(&ctx)?;
    assert_eq!(report.verdict, Verdict::Pass);
    assert!(report.checks.iter().all(|c| c.matches));

    let integrity = fixture.read_text("reports/ledger/INTEGRITY.md")?;
    assert!(integrity.contains("STATUS: PASS"));
    assert!(integrity.contains("RUN_ID: run-20260114T120000Z-0badcafe"));
    Ok(())
}

#[test]
fn any_anchor_altered_by_one_character_blocks() {
    for (path, key, check) in [
        (CHECKSUMS, "scope_manifest_sha:", CheckId::ScopeManifestSha),
        (MERKLE, "MERKLE_ROOT:", CheckId::MerkleRoot),
        (CHAIN, "final_chain_hash:", CheckId::FinalChainHash),
    ] {
        let fixture = f123();
        fixture.ledger.anchor(&fixed_context()).unwrap();
        alter_anchor(&fixture, path, key);

        let report = fixture.ledger.verify(&fixed_context()).unwrap();
        assert_eq!(report.verdict, Verdict::Blocked, "{check}");
        assert_eq!(report.reason_code, Some(ReasonCode::Mismatch), "{check}");
        let failed: Vec<CheckId> = report.failed_checks().map(|c| c.check_id).collect();
        assert_eq!(failed, vec![check]);
    }
}

#[test]
fn deleted_merkle_anchor_fails_closed() {
    init_tracing();
    let fixture = f123();
    fixture.ledger.anchor(&fixed_context()).unwrap();
    fixture.remove(MERKLE).unwrap();

    let report = fixture.ledger.verify(&fixed_context()).unwrap();
    assert_eq!(report.verdict, Verdict::Blocked);

    let merkle = report.check(CheckId::MerkleRoot).unwrap();
    assert!(!merkle.matches);
    assert_eq!(merkle.anchored, None);
    assert_eq!(merkle.reason_code, Some(ReasonCode::MissingAnchor));
    assert!(report.check(CheckId::ScopeManifestSha).unwrap().matches);
    assert!(report.check(CheckId::FinalChainHash).unwrap().matches);

    let outcome = report.outcome();
    assert_eq!(outcome.reason_code, Some(ReasonCode::MissingAnchor));
    assert_eq!(outcome.next_action.as_deref(), Some("recompute and re-anchor"));
}

#[test]
fn garbled_anchor_line_is_missing_not_pass() {
    let fixture = f123();
    fixture.ledger.anchor(&fixed_context()).unwrap();
    fixture
        .write(MERKLE, b"# Merkle Root\n\nMERKLE_ROOT: not-a-hash\n")
        .unwrap();

    let report = fixture.ledger.verify(&fixed_context()).unwrap();
    let merkle = report.check(CheckId::MerkleRoot).unwrap();
    assert_eq!(merkle.reason_code, Some(ReasonCode::MissingAnchor));
    assert!(!report.is_pass());
}

#[cfg(unix)]
#[test]
fn line_break_in_a_file_name_fails_closed() {
    let fixture = TreeFixture::new(&sample_reports()).unwrap();
    std::fs::write(
        fixture.root().join("reports").join("b\nfinal_chain_hash: 0"),
        b"forged\n",
    )
    .unwrap();

    let err = fixture.ledger.anchor(&fixed_context()).unwrap_err();
    assert_eq!(err.reason_code(), ReasonCode::StoreError);
    assert!(fixture.read_text(CHAIN).is_err());

    let outcome = fixture.ledger.verify_outcome(&fixed_context());
    assert!(!outcome.is_pass());
    assert_eq!(outcome.reason_code, Some(ReasonCode::StoreError));
}

#[test]
fn one_flipped_byte_changes_content_aggregates_only() {
    let fixture = f123();
    let before = fixture.ledger.anchor(&fixed_context()).unwrap();
    fixture.write("f2", b"Y\n").unwrap();
    let after = fixture.ledger.snapshot().unwrap();

    assert_eq!(before.record("f1"), after.record("f1"));
    assert_ne!(before.record("f2"), after.record("f2"));
    assert_eq!(before.record("f3"), after.record("f3"));
    assert_eq!(before.scope_manifest_sha(), after.scope_manifest_sha());
    assert_ne!(before.merkle_root(), after.merkle_root());
    assert_ne!(before.final_chain_hash(), after.final_chain_hash());

    let report = fixture.ledger.verify(&fixed_context()).unwrap();
    assert_eq!(report.failed_checks().count(), 2);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].kind, FindingKind::ContentChanged);
    assert_eq!(report.findings[0].path.as_deref(), Some("f2"));
}

#[test]
fn membership_changes_move_the_manifest() {
    let fixture = f123();
    fixture.ledger.anchor(&fixed_context()).unwrap();
    fixture.write("f4", b"w\n").unwrap();
    fixture.remove("f3").unwrap();

    let report = fixture.ledger.verify(&fixed_context()).unwrap();
    assert!(!report.check(CheckId::ScopeManifestSha).unwrap().matches);

    let kinds: Vec<(FindingKind, Option<ReasonCode>)> =
        report.findings.iter().map(|f| (f.kind, f.reason_code)).collect();
    assert_eq!(
        kinds,
        vec![
            (FindingKind::Removed, Some(ReasonCode::MissingSourceFile)),
            (FindingKind::Added, None),
        ]
    );
}

#[test]
fn full_runs_are_idempotent() {
    let fixture = TreeFixture::new(&sample_reports()).unwrap();
    let first = fixture.ledger.anchor(&fixed_context()).unwrap();
    let anchors_first = Anchors::load(fixture.ledger.store(), &fixture.ledger.config().outputs).unwrap();

    let second = fixture.ledger.anchor(&context_at(2026, 3, 1, 8)).unwrap();
    let anchors_second = Anchors::load(fixture.ledger.store(), &fixture.ledger.config().outputs).unwrap();

    assert_eq!(first.fingerprint(), second.fingerprint());
    for check in CheckId::ALL {
        assert_eq!(anchors_first.get(check), anchors_second.get(check));
    }
}

#[test]
fn rerun_with_new_volatile_fields_still_passes() {
    let fixture = TreeFixture::new(&sample_reports()).unwrap();
    fixture.ledger.anchor(&fixed_context()).unwrap();

    fixture
        .write(
            "reports/gate.md",
            b"# Gate\r\nRUN_ID: run-20260301T080000Z-5eed5eed\r\nSTARTED_AT: 2026-03-01T08:00:00.250Z\r\nSTATUS: PASS\r\nchecks_passed: 12\r\n",
        )
        .unwrap();
    fixture
        .write(
            "reports/diff/summary.md",
            b"# Diff\n<!-- ledger:volatile -->\n```diff\n-older\n+newer\n@@ -1 +1 @@\n```\nVERDICT: PASS\n",
        )
        .unwrap();

    let report = fixture.ledger.verify(&context_at(2026, 3, 1, 8)).unwrap();
    assert!(report.is_pass(), "{report:#?}");
    assert!(report
        .findings
        .iter()
        .all(|f| f.kind == FindingKind::VolatileOnly));
}

#[test]
fn status_flip_is_never_normalized_away() {
    let fixture = TreeFixture::new(&sample_reports()).unwrap();
    fixture.ledger.anchor(&fixed_context()).unwrap();
    let original = fixture.read_text("reports/risk.md").unwrap();
    fixture
        .write("reports/risk.md", original.replace("STATUS: PASS", "STATUS: FAIL").as_bytes())
        .unwrap();

    let outcome = fixture.ledger.verify_outcome(&fixed_context());
    assert!(!outcome.is_pass());
    assert_eq!(outcome.reason_code, Some(ReasonCode::Mismatch));
    assert_eq!(outcome.next_action.as_deref(), Some("investigate manual edit"));
}

#[test]
fn verification_never_rewrites_anchors() {
    let fixture = f123();
    fixture.ledger.anchor(&fixed_context()).unwrap();
    let before: Vec<String> = [CHECKSUMS, MERKLE, CHAIN]
        .iter()
        .map(|p| fixture.read_text(p).unwrap())
        .collect();

    fixture.write("f1", b"tampered\n").unwrap();
    fixture.ledger.verify_and_record(&context_at(2026, 2, 1, 0)).unwrap();

    let after: Vec<String> = [CHECKSUMS, MERKLE, CHAIN]
        .iter()
        .map(|p| fixture.read_text(p).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn machine_artifact_carries_full_values() {
    let fixture = f123();
    let snapshot = fixture.ledger.anchor(&fixed_context()).unwrap();
    fixture.ledger.verify_and_record(&fixed_context()).unwrap();

    let doc = LedgerDocument::from_json(&fixture.read_text("reports/ledger/ledger.json").unwrap())
        .unwrap();
    assert_eq!(doc.merkle_root, snapshot.merkle_root().to_string());
    assert_eq!(doc.final_chain_hash, snapshot.final_chain_hash().to_string());
    assert_eq!(doc.fingerprint, snapshot.fingerprint().to_hex());
    assert_eq!(doc.files.len(), 3);

    let integrity =
        IntegrityDocument::from_json(&fixture.read_text("reports/ledger/integrity.json").unwrap())
            .unwrap();
    assert_eq!(integrity.report.verdict, Verdict::Pass);
    assert_eq!(integrity.report.checks[0].computed.len(), 64);
    assert_eq!(integrity.computed_fingerprint, snapshot.fingerprint().to_hex());
}

#[test]
fn blocked_verify_leaves_anchored_machine_artifact() {
    let fixture = f123();
    let snapshot = fixture.ledger.anchor(&fixed_context()).unwrap();
    let anchored = fixture.read_text("reports/ledger/ledger.json").unwrap();

    fixture.write("f2", b"tampered\n").unwrap();
    let report = fixture.ledger.verify_and_record(&fixed_context()).unwrap();
    assert_eq!(report.verdict, Verdict::Blocked);

    assert_eq!(fixture.read_text("reports/ledger/ledger.json").unwrap(), anchored);
    let doc = LedgerDocument::from_json(&anchored).unwrap();
    assert_eq!(doc.fingerprint, snapshot.fingerprint().to_hex());

    let integrity =
        IntegrityDocument::from_json(&fixture.read_text("reports/ledger/integrity.json").unwrap())
            .unwrap();
    assert_eq!(integrity.report.verdict, Verdict::Blocked);
    assert_ne!(integrity.computed_fingerprint, doc.fingerprint);
}

#[test]
fn inclusion_proof_against_anchored_root() {
    let fixture = f123();
    fixture.ledger.anchor(&fixed_context()).unwrap();

    let anchors = Anchors::load(fixture.ledger.store(), &fixture.ledger.config().outputs).unwrap();
    let root: MerkleRoot = anchors.get(CheckId::MerkleRoot).unwrap().parse().unwrap();

    let proof = fixture.ledger.prove("f3").unwrap().unwrap();
    proof.validate().unwrap();
    let record = fixture.ledger.hash_file("f3").unwrap();
    assert!(verify_inclusion(&leaf_hash("f3", record.sha256_norm()), &proof, &root));

    fixture.write("f3", b"zz\n").unwrap();
    let tampered = fixture.ledger.hash_file("f3").unwrap();
    assert!(!verify_inclusion(&leaf_hash("f3", tampered.sha256_norm()), &proof, &root));

    assert!(fixture.ledger.prove("absent").unwrap().is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalization_is_idempotent(text in report_text()) {
        let rules = RuleSet::standard().unwrap();
        let once = rules.normalize(&text);
        prop_assert_eq!(rules.normalize(&once), once);
    }

    #[test]
    fn anchor_then_verify_always_passes(tree in evidence_tree(12)) {
        let files: Vec<(String, String)> = tree
            .into_iter()
            .map(|(path, body)| (format!("reports/{path}"), body))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, b)| (p.as_str(), b.as_str())).collect();

        let ledger = memory_ledger(&borrowed).unwrap();
        let anchored = ledger.anchor(&fixed_context()).unwrap();
        let report = ledger.verify(&fixed_context()).unwrap();
        prop_assert!(report.is_pass());
        prop_assert_eq!(anchored.fingerprint(), ledger.snapshot().unwrap().fingerprint());
    }
}
