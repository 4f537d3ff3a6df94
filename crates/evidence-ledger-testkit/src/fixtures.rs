//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use evidence_ledger::{Ledger, LedgerConfig, RunContext};
use evidence_ledger_core::{ScopeRule, ScopeSpec};
use evidence_ledger_store::{EvidenceStore, FsStore, MemoryStore};

/// A run context pinned to 2026-01-14T12:00:00Z with a fixed run id.
pub fn fixed_context() -> RunContext {
    RunContext::fixed(
        "run-20260114T120000Z-0badcafe",
        Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    )
}

/// A run context at the given UTC hour, with a random run id suffix.
///
/// Invalid dates fall back to now.
pub fn context_at(year: i32, month: u32, day: u32, hour: u32) -> RunContext {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .map_or_else(RunContext::new, RunContext::started_at)
}

/// Scope over everything under `reports/`.
pub fn reports_config() -> LedgerConfig {
    LedgerConfig {
        scope: ScopeSpec::new().rule(ScopeRule::new("reports")),
        ..LedgerConfig::default()
    }
}

/// A ledger over an on-disk temporary tree.
pub struct TreeFixture {
    pub dir: TempDir,
    pub ledger: Ledger<FsStore>,
}

impl TreeFixture {
    /// Create the tree, write `files`, and open a ledger scoped to `reports/`.
    pub fn new(files: &[(&str, &str)]) -> anyhow::Result<Self> {
        Self::with_config(files, reports_config())
    }

    pub fn with_config(files: &[(&str, &str)], config: LedgerConfig) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let store = FsStore::open(dir.path())?;
        for (path, contents) in files {
            store.write(path, contents.as_bytes())?;
        }
        let ledger = Ledger::new(store, config)?;
        Ok(Self { dir, ledger })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Overwrite a file through the store.
    pub fn write(&self, path: &str, contents: &[u8]) -> anyhow::Result<()> {
        Ok(self.ledger.store().write(path, contents)?)
    }

    /// Delete a file directly on disk.
    pub fn remove(&self, path: &str) -> anyhow::Result<()> {
        std::fs::remove_file(self.root().join(path))?;
        Ok(())
    }

    /// Read a file as text.
    pub fn read_text(&self, path: &str) -> anyhow::Result<String> {
        let bytes = self.ledger.store().read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// A ledger over an in-memory tree scoped to `reports/`.
pub fn memory_ledger(files: &[(&str, &str)]) -> anyhow::Result<Ledger<MemoryStore>> {
    let store = MemoryStore::with_files(files.iter().copied())?;
    Ok(Ledger::new(store, reports_config())?)
}

/// A small gate-report tree with volatile fields.
pub fn sample_reports() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "reports/gate.md",
            "# Gate\nRUN_ID: run-20260114T120000Z-0badcafe\nSTARTED_AT: 2026-01-14T12:00:00Z\nSTATUS: PASS\nchecks_passed: 12\n",
        ),
        (
            "reports/risk.md",
            "# Risk\nSTARTED_AT: 2026-01-14T12:00:03Z\nmax_drawdown: 0.04\nSTATUS: PASS\n",
        ),
        (
            "reports/diff/summary.md",
            "# Diff\n<!-- ledger:volatile -->\n```diff\n-old\n+new\n```\nVERDICT: PASS\n",
        ),
    ]
}
