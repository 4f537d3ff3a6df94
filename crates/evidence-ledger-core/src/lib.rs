//! # Evidence Ledger Core
//!
//! Pure primitives for the evidence ledger: canonicalization, dual hashing,
//! the scope manifest, the receipt chain and the Merkle tree.
//!
//! This crate contains no I/O. Reading files and writing reports live in
//! `evidence-ledger-store` and `evidence-ledger`.
//!
//! ## Key Types
//!
//! - [`Sha256Hash`] - A digest; every aggregate hashes the hex text of its inputs
//! - [`RuleSet`] - The ordered, versioned normalization table
//! - [`HashPair`] - `{sha256_raw, sha256_norm}` for one file
//! - [`ScopeManifest`] - Sorted in-scope paths and `SCOPE_MANIFEST_SHA`
//! - [`ReceiptChain`] - Order-sensitive fold from `GENESIS`
//! - [`MerkleTree`] - Binary tree with odd-node duplication and inclusion proofs
//!
//! ## Normalization
//!
//! Volatile fields are rewritten to placeholders before hashing so that a
//! rerun with identical content yields identical aggregates. The rule table
//! must pass [`run_guard`] before it is trusted. See [`normalize`].

pub mod chain;
pub mod error;
pub mod guard;
pub mod hash;
pub mod manifest;
pub mod merkle;
pub mod normalize;
pub mod scope;
pub mod types;

pub use chain::{fold_chain, ChainHead, ChainLink, ReceiptChain, GENESIS};
pub use error::{CoreError, Result};
pub use guard::{run_guard, standard_canaries, Canary, CanaryExpectation, GuardReport};
pub use hash::{sha256_hex, Sha256Hash};
pub use manifest::{manifest_sha, ManifestDiff, ScopeManifest};
pub use merkle::{
    leaf_hash, merkle_root, parent_hash, verify_inclusion, InclusionProof, MerkleRoot,
    MerkleTree, ProofStep, Side, EMPTY_ROOT,
};
pub use normalize::{RuleSet, RuleSpec, RULES_VERSION};
pub use scope::{select_scope, validate_relative_path, OutputRegistry, ScopeRule, ScopeSpec};
pub use types::{EvidenceFile, FileRecord, HashPair};
