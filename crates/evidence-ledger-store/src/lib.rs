//! # Evidence Ledger Store
//!
//! Storage abstraction for the evidence ledger. Provides a trait-based
//! interface over an evidence tree with filesystem and in-memory
//! implementations, plus the scope collector built on top of it.
//!
//! ## Key Types
//!
//! - [`EvidenceStore`] - The trait for listing, reading and writing files
//! - [`FsStore`] - A repository checkout on disk
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`collect`] - Scope enumeration into a sorted manifest
//!
//! ## Usage
//!
//! ```rust,no_run
//! use evidence_ledger_core::{OutputRegistry, ScopeRule, ScopeSpec};
//! use evidence_ledger_store::{collect, FsStore};
//!
//! let store = FsStore::open(".").unwrap();
//! let spec = ScopeSpec::new().rule(ScopeRule::new("reports").with_extensions(&["md"]));
//! let manifest = collect(&store, &spec, &OutputRegistry::new()).unwrap();
//! println!("{} files in scope", manifest.len());
//! ```
//!
//! ## Design Notes
//!
//! - **Missing files are errors**: reading an absent path yields
//!   [`StoreError::NotFound`], which the ledger reports as a missing source
//!   file. Nothing is silently skipped.
//! - **Single writer**: no locking beyond what `MemoryStore` needs for
//!   `Sync`. Concurrent external writers are not supported.

pub mod collector;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use collector::collect;
pub use error::{Result, StoreError};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use traits::{EvidenceStore, EvidenceStoreExt};
