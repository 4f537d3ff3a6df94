//! The Ledger: unified API over the evidence ledger.
//!
//! The Ledger brings together the store, the normalization rules and the
//! configured scope. `anchor` persists the current state; `verify` checks
//! the current state against what was persisted.

use std::sync::Arc;

use evidence_ledger_core::{
    run_guard, standard_canaries, Canary, FileRecord, GuardReport, HashPair, InclusionProof,
    OutputRegistry, RuleSet, ScopeManifest,
};
use evidence_ledger_store::{collect, EvidenceStore, EvidenceStoreExt, StoreError};
use tracing::{info, warn};

use crate::anchor::Anchors;
use crate::config::LedgerConfig;
use crate::context::RunContext;
use crate::error::{LedgerError, Outcome, Result};
use crate::report::{
    render_checksums, render_integrity, render_merkle_root, render_receipt_chain,
    IntegrityDocument, LedgerDocument,
};
use crate::snapshot::LedgerSnapshot;
use crate::verify::{drift_findings, verify, IntegrityReport};

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Collecting the evidence scope
/// - Hashing evidence files
/// - Anchoring the aggregates to report artifacts
/// - Verifying current evidence against those anchors
pub struct Ledger<S: EvidenceStore> {
    /// The evidence tree.
    store: Arc<S>,
    /// Configuration.
    config: LedgerConfig,
    /// The normalization table, guard-checked.
    rules: RuleSet,
    /// Every path the ledger writes. Never in scope.
    registry: OutputRegistry,
    /// Result of the normalization guard run at construction.
    guard: GuardReport,
}

impl<S: EvidenceStore> Ledger<S> {
    /// Create a ledger with the built-in rule table.
    ///
    /// Fails if the configuration is invalid or the normalization guard
    /// rejects the rule table. Nothing is read from the store.
    pub fn new(store: S, config: LedgerConfig) -> Result<Self> {
        Self::with_rules(store, config, RuleSet::standard()?, &standard_canaries())
    }

    /// Create a ledger with a custom rule table, guarded by `canaries`.
    pub fn with_rules(
        store: S,
        config: LedgerConfig,
        rules: RuleSet,
        canaries: &[Canary],
    ) -> Result<Self> {
        config.validate()?;
        let guard = run_guard(&rules, canaries)?;
        let registry = config.outputs.registry()?;

        info!(
            rules_version = rules.version(),
            norm_rules_sha = %guard.rules_sha.short(12),
            canaries = guard.canaries_checked,
            outputs = registry.len(),
            "ledger ready"
        );

        Ok(Self {
            store: Arc::new(store),
            config,
            rules,
            registry,
            guard,
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn registry(&self) -> &OutputRegistry {
        &self.registry
    }

    pub fn guard_report(&self) -> &GuardReport {
        &self.guard
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Computation
    // ─────────────────────────────────────────────────────────────────────────

    /// Enumerate the in-scope files, sorted, outputs excluded.
    pub fn collect(&self) -> Result<ScopeManifest> {
        Ok(collect(&*self.store, &self.config.scope, &self.registry)?)
    }

    /// Read and dual-hash one file.
    pub fn hash_file(&self, path: &str) -> Result<FileRecord> {
        self.store
            .hash_file(path, &self.rules)
            .map_err(missing_source)
    }

    fn hash_pair(&self, path: &str) -> Result<HashPair> {
        let file = self.store.read_evidence(path).map_err(missing_source)?;
        Ok(file.hash_pair(&self.rules))
    }

    /// Collect, hash and aggregate the current evidence.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let manifest = self.collect()?;
        self.snapshot_of(manifest)
    }

    /// Hash and aggregate a previously collected manifest.
    pub fn snapshot_of(&self, manifest: ScopeManifest) -> Result<LedgerSnapshot> {
        LedgerSnapshot::compute(manifest, &self.rules, |path| self.hash_pair(path))
    }

    /// Inclusion proof for `path` in the current Merkle tree, if in scope.
    pub fn prove(&self, path: &str) -> Result<Option<InclusionProof>> {
        Ok(self.snapshot()?.proof(path))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Anchoring
    // ─────────────────────────────────────────────────────────────────────────

    /// Compute the current aggregates and persist them.
    ///
    /// Writes the checksums, Merkle root, receipt chain and machine
    /// artifacts. Returns the snapshot that was anchored.
    pub fn anchor(&self, ctx: &RunContext) -> Result<LedgerSnapshot> {
        let snapshot = self.snapshot()?;
        let outputs = &self.config.outputs;

        self.store
            .write(&outputs.checksums, render_checksums(ctx, &snapshot).as_bytes())?;
        self.store
            .write(&outputs.merkle_root, render_merkle_root(ctx, &snapshot).as_bytes())?;
        self.store
            .write(&outputs.receipt_chain, render_receipt_chain(ctx, &snapshot).as_bytes())?;
        self.store.write(
            &outputs.machine,
            LedgerDocument::new(ctx, &snapshot).to_json()?.as_bytes(),
        )?;

        info!(
            run_id = ctx.run_id(),
            files = snapshot.file_count(),
            merkle_root = %snapshot.merkle_root(),
            final_chain_hash = %snapshot.final_chain_hash(),
            "anchored evidence ledger"
        );
        Ok(snapshot)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Compare the current evidence against the persisted anchors.
    ///
    /// Reads only. Missing anchors produce a `BLOCKED` report rather than an
    /// error.
    pub fn verify(&self, ctx: &RunContext) -> Result<IntegrityReport> {
        Ok(self.verify_snapshot(ctx)?.0)
    }

    fn verify_snapshot(&self, ctx: &RunContext) -> Result<(IntegrityReport, LedgerSnapshot)> {
        let anchors = Anchors::load(&*self.store, &self.config.outputs)?;
        let snapshot = self.snapshot()?;

        let checks = verify(&anchors, &snapshot);
        let findings = match anchors.prior() {
            Some(prior) if self.config.verify_per_file => drift_findings(prior, &snapshot),
            _ => Vec::new(),
        };
        Ok((IntegrityReport::new(ctx, checks, findings), snapshot))
    }

    /// Verify, then write `INTEGRITY.md` and `integrity.json`.
    ///
    /// Anchor artifacts and `ledger.json` are never rewritten here.
    pub fn verify_and_record(&self, ctx: &RunContext) -> Result<IntegrityReport> {
        let (report, snapshot) = self.verify_snapshot(ctx)?;
        let outputs = &self.config.outputs;

        self.store.write(
            &outputs.integrity,
            render_integrity(ctx, &report, self.config.display_prefix_len).as_bytes(),
        )?;
        let document = IntegrityDocument::new(report, &snapshot);
        self.store
            .write(&outputs.integrity_machine, document.to_json()?.as_bytes())?;

        Ok(document.report)
    }

    /// [`verify_and_record`](Self::verify_and_record), with every error
    /// folded into a `BLOCKED` outcome.
    pub fn verify_outcome(&self, ctx: &RunContext) -> Outcome {
        match self.verify_and_record(ctx) {
            Ok(report) => report.outcome(),
            Err(e) => {
                warn!(
                    run_id = ctx.run_id(),
                    error = %e,
                    reason_code = %e.reason_code(),
                    "verification could not complete"
                );
                Outcome::from(&e)
            }
        }
    }
}

/// An absent in-scope file is a missing source, not a store failure.
fn missing_source(error: StoreError) -> LedgerError {
    match error {
        StoreError::NotFound(path) => LedgerError::MissingSourceFile(path),
        other => other.into(),
    }
}
