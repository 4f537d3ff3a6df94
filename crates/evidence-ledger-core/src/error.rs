//! Error types for the evidence ledger core.

use thiserror::Error;

/// Core errors that can occur during pure ledger computation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid sha256 digest: {0:?}")]
    InvalidDigest(String),

    #[error("invalid normalization rule {id}: {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("normalization guard failed on canary {canary}: {reason}")]
    NormalizationGuard { canary: String, reason: String },

    #[error("invalid evidence path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid merkle proof: {0}")]
    InvalidProof(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
