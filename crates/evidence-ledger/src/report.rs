//! Rendering of the persisted ledger artifacts.
//!
//! Human reports are Markdown. Each begins with a title, then the
//! `RUN_ID:`/`STARTED_AT:` header from the run context, then its anchor
//! lines as `key: value` at the start of a line so that
//! [`Anchors::parse`](crate::anchor::Anchors::parse) can read them back.

use std::fmt::Write as _;

use evidence_ledger_core::{ChainLink, FileRecord};
use serde::{Deserialize, Serialize};

use crate::anchor::{
    FINAL_CHAIN_KEY, MERKLE_ROOT_KEY, NORM_RULES_SHA_KEY, NORM_RULES_VERSION_KEY,
    SCOPE_MANIFEST_KEY,
};
use crate::context::RunContext;
use crate::error::Result;
use crate::snapshot::LedgerSnapshot;
use crate::verify::IntegrityReport;

fn header(title: &str, ctx: &RunContext) -> String {
    format!("# {title}\n\n{}\n", ctx.header_lines())
}

/// `CHECKSUMS.md`: manifest anchor, rule table identity and one row per file.
pub fn render_checksums(ctx: &RunContext, snapshot: &LedgerSnapshot) -> String {
    let mut out = header("Evidence Checksums", ctx);
    let _ = writeln!(out, "{SCOPE_MANIFEST_KEY}: {}", snapshot.scope_manifest_sha());
    let _ = writeln!(out, "{NORM_RULES_VERSION_KEY}: {}", snapshot.rules_version());
    let _ = writeln!(out, "{NORM_RULES_SHA_KEY}: {}", snapshot.rules_sha());
    let _ = writeln!(out, "file_count: {}", snapshot.file_count());
    out.push_str("\n| path | sha256_raw | sha256_norm |\n|------|------------|-------------|\n");
    for record in snapshot.records() {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} |",
            record.path,
            record.sha256_raw(),
            record.sha256_norm()
        );
    }
    out
}

/// `MERKLE_ROOT.md`: the root and leaf count.
pub fn render_merkle_root(ctx: &RunContext, snapshot: &LedgerSnapshot) -> String {
    let mut out = header("Merkle Root", ctx);
    let _ = writeln!(out, "{MERKLE_ROOT_KEY}: {}", snapshot.merkle_root());
    let _ = writeln!(out, "leaf_count: {}", snapshot.tree().leaf_count());
    out
}

/// `RECEIPT_CHAIN.md`: the final hash and every link in order.
pub fn render_receipt_chain(ctx: &RunContext, snapshot: &LedgerSnapshot) -> String {
    let mut out = header("Receipt Chain", ctx);
    let _ = writeln!(out, "{FINAL_CHAIN_KEY}: {}", snapshot.final_chain_hash());
    let _ = writeln!(out, "link_count: {}", snapshot.chain().len());
    out.push_str("\n| index | path | sha256_norm | chain_hash |\n|-------|------|-------------|------------|\n");
    for link in snapshot.chain().links() {
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} |",
            link.index, link.path, link.sha256_norm, link.chain_hash
        );
    }
    out
}

/// First `len` characters of `value`, with an ellipsis if cut.
fn prefix(value: &str, len: usize) -> String {
    match value.char_indices().nth(len) {
        Some((cut, _)) => format!("{}…", &value[..cut]),
        None => value.to_string(),
    }
}

/// `INTEGRITY.md`: verdict, per-check table and drift findings.
///
/// Hashes are truncated to `prefix_len` characters; full values live in
/// the machine artifact.
pub fn render_integrity(ctx: &RunContext, report: &IntegrityReport, prefix_len: usize) -> String {
    let mut out = header("Integrity Verification", ctx);
    let _ = writeln!(out, "STATUS: {}", report.verdict);
    let _ = writeln!(
        out,
        "reason_code: {}",
        report.reason_code.map_or("NONE", |c| c.as_str())
    );
    let _ = writeln!(
        out,
        "next_action: {}",
        report.next_action.as_deref().unwrap_or("none")
    );

    out.push_str("\n| check_id | anchored | computed | match | note |\n|----------|----------|----------|-------|------|\n");
    for check in &report.checks {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            check.check_id,
            check
                .anchored
                .as_deref()
                .map_or_else(|| "(missing)".to_string(), |v| prefix(v, prefix_len)),
            prefix(&check.computed, prefix_len),
            if check.matches { "yes" } else { "NO" },
            check.note
        );
    }

    if !report.findings.is_empty() {
        out.push_str("\n## Findings\n\n");
        for finding in &report.findings {
            let _ = write!(out, "- {}", finding.kind.as_str());
            if let Some(path) = &finding.path {
                let _ = write!(out, " `{path}`");
            }
            if let Some(code) = finding.reason_code {
                let _ = write!(out, " [{code}]");
            }
            let _ = writeln!(out, ": {}", finding.detail);
        }
    }
    out
}

/// `ledger.json`: every value untruncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub run_id: String,
    pub started_at: String,
    pub norm_rules_version: String,
    pub norm_rules_sha: String,
    pub scope_manifest_sha: String,
    pub merkle_root: String,
    pub final_chain_hash: String,
    pub fingerprint: String,
    pub file_count: usize,
    pub files: Vec<FileRecord>,
    pub chain: Vec<ChainLink>,
}

impl LedgerDocument {
    pub fn new(ctx: &RunContext, snapshot: &LedgerSnapshot) -> Self {
        Self {
            run_id: ctx.run_id().to_string(),
            started_at: ctx.started_at_str(),
            norm_rules_version: snapshot.rules_version().to_string(),
            norm_rules_sha: snapshot.rules_sha().to_hex(),
            scope_manifest_sha: snapshot.scope_manifest_sha().to_hex(),
            merkle_root: snapshot.merkle_root().to_string(),
            final_chain_hash: snapshot.final_chain_hash().to_string(),
            fingerprint: snapshot.fingerprint().to_hex(),
            file_count: snapshot.file_count(),
            files: snapshot.records().to_vec(),
            chain: snapshot.chain().links().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `integrity.json`: a verification result next to the fingerprint of the
/// tree it was computed over.
///
/// Written by verification only; `ledger.json` keeps the anchored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityDocument {
    pub computed_fingerprint: String,
    #[serde(flatten)]
    pub report: IntegrityReport,
}

impl IntegrityDocument {
    pub fn new(report: IntegrityReport, snapshot: &LedgerSnapshot) -> Self {
        Self {
            computed_fingerprint: snapshot.fingerprint().to_hex(),
            report,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
