//! Error types for the store module.

use evidence_ledger_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A path named in scope does not exist or is not a regular file.
    #[error("evidence file not found: {0}")]
    NotFound(String),

    /// I/O failure on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("walk error under {path}: {reason}")]
    Walk { path: String, reason: String },

    /// A path could not be represented as a root-relative POSIX string.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// Core validation error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Whether this error means the file is absent rather than unreadable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
