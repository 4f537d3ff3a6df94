//! # Evidence Ledger
//!
//! A tamper-evident ledger over a tree of evidence reports. It proves that
//! the reports a pipeline produced have not been edited between the time
//! they were written and the time they are relied upon.
//!
//! ## Overview
//!
//! Each in-scope file gets two hashes: one over its exact bytes and one over
//! a normalized form with volatile fields (timestamps, run identifiers,
//! marked diff blocks) replaced by placeholders. From the normalized hashes
//! the ledger derives three aggregates:
//!
//! - **Scope manifest hash**: which files are in scope
//! - **Merkle root**: what they contain, with per-file inclusion proofs
//! - **Receipt chain**: what they contain, in which order
//!
//! `anchor` writes the aggregates into Markdown reports. `verify` recomputes
//! them and compares against those reports. The verdict is `PASS` only when
//! all three match; anything missing or unreadable is `BLOCKED`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use evidence_ledger::{Ledger, LedgerConfig, RunContext};
//! use evidence_ledger::store::FsStore;
//!
//! let config = LedgerConfig::from_json_file("ledger.json").unwrap();
//! let ledger = Ledger::new(FsStore::open(".").unwrap(), config).unwrap();
//!
//! // After the pipeline has produced its reports:
//! ledger.anchor(&RunContext::new()).unwrap();
//!
//! // Later, before relying on them:
//! let outcome = ledger.verify_outcome(&RunContext::new());
//! if !outcome.is_pass() {
//!     eprintln!("{:?}: {}", outcome.reason_code, outcome.message);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `evidence_ledger::core` - Hashing, normalization, chain and Merkle primitives
//! - `evidence_ledger::store` - Store abstraction and scope collection

pub mod anchor;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod report;
pub mod snapshot;
pub mod verify;

// Re-export component crates
pub use evidence_ledger_core as core;
pub use evidence_ledger_store as store;

// Re-export main types for convenience
pub use anchor::{Anchors, CheckId, PriorChecksums};
pub use config::{LedgerConfig, OutputPaths};
pub use context::RunContext;
pub use error::{LedgerError, Outcome, ReasonCode, Result, Verdict};
pub use ledger::Ledger;
pub use report::{IntegrityDocument, LedgerDocument};
pub use snapshot::LedgerSnapshot;
pub use verify::{drift_findings, Finding, FindingKind, IntegrityCheckResult, IntegrityReport};

// Re-export commonly used core types
pub use evidence_ledger_core::{
    ChainHead, FileRecord, HashPair, InclusionProof, MerkleRoot, RuleSet, ScopeManifest,
    ScopeRule, ScopeSpec, Sha256Hash,
};
