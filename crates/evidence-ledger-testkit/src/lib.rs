//! # Evidence Ledger Testkit
//!
//! Testing utilities for the evidence ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known scopes and files with expected hashes, computed independently
//! - **Generators**: Proptest strategies for report text and evidence trees
//! - **Fixtures**: Ledgers over temporary directories and in-memory stores
//!
//! ## Golden Vectors
//!
//! ```rust
//! use evidence_ledger_testkit::vectors::all_vectors;
//! use evidence_ledger_core::ScopeManifest;
//!
//! for vector in all_vectors() {
//!     let manifest = vector.manifest();
//!     assert_eq!(manifest.manifest_sha().to_hex(), vector.scope_manifest_sha);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use evidence_ledger_testkit::generators::report_text;
//!
//! proptest! {
//!     #[test]
//!     fn normalization_is_idempotent(text in report_text()) {
//!         let rules = evidence_ledger_core::RuleSet::standard().unwrap();
//!         let once = rules.normalize(&text);
//!         prop_assert_eq!(rules.normalize(&once), once);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use evidence_ledger_testkit::fixtures::{fixed_context, sample_reports, TreeFixture};
//!
//! let fixture = TreeFixture::new(&sample_reports()).unwrap();
//! fixture.ledger.anchor(&fixed_context()).unwrap();
//! assert!(fixture.ledger.verify(&fixed_context()).unwrap().is_pass());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fixed_context, memory_ledger, sample_reports, TreeFixture};
pub use generators::{evidence_tree, report_text};
pub use vectors::{all_vectors, hash_vectors, verify_hash_vectors, GoldenVector};
