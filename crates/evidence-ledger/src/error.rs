//! Error types for the ledger, and the structured outcome callers consume.

use std::fmt;

use evidence_ledger_core::CoreError;
use evidence_ledger_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Pure computation or validation error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A path in scope vanished between collection and hashing.
    #[error("missing source file: {0}")]
    MissingSourceFile(String),

    /// Configuration rejected before any work was done.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Machine artifact could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Map onto the stable reason-code taxonomy.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            LedgerError::MissingSourceFile(_) => ReasonCode::MissingSourceFile,
            LedgerError::Config(_) => ReasonCode::ConfigError,
            LedgerError::Serialization(_) => ReasonCode::StoreError,
            LedgerError::Store(StoreError::NotFound(_)) => ReasonCode::MissingSourceFile,
            LedgerError::Store(StoreError::Core(core)) => core_reason(core),
            LedgerError::Store(_) => ReasonCode::StoreError,
            LedgerError::Core(core) => core_reason(core),
        }
    }
}

fn core_reason(error: &CoreError) -> ReasonCode {
    match error {
        CoreError::NormalizationGuard { .. } => ReasonCode::NormalizationGuardFailure,
        CoreError::InvalidDigest(_) => ReasonCode::MissingAnchor,
        CoreError::InvalidProof(_) => ReasonCode::Mismatch,
        CoreError::InvalidRule { .. } | CoreError::InvalidPath { .. } => ReasonCode::ConfigError,
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Stable, machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    MissingSourceFile,
    MissingAnchor,
    Mismatch,
    NormalizationGuardFailure,
    StoreError,
    ConfigError,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::MissingSourceFile => "MISSING_SOURCE_FILE",
            ReasonCode::MissingAnchor => "MISSING_ANCHOR",
            ReasonCode::Mismatch => "MISMATCH",
            ReasonCode::NormalizationGuardFailure => "NORMALIZATION_GUARD_FAILURE",
            ReasonCode::StoreError => "STORE_ERROR",
            ReasonCode::ConfigError => "CONFIG_ERROR",
        }
    }

    /// What an operator should do about it.
    pub fn next_action(&self) -> &'static str {
        match self {
            ReasonCode::MissingSourceFile => "restore the missing file or re-anchor",
            ReasonCode::MissingAnchor => "recompute and re-anchor",
            ReasonCode::Mismatch => "investigate manual edit",
            ReasonCode::NormalizationGuardFailure => "fix the normalization rule table",
            ReasonCode::StoreError => "check evidence store access and rerun",
            ReasonCode::ConfigError => "fix the ledger configuration",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Blocked,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Blocked => "BLOCKED",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{status, reason_code, message, next_action}` returned across the
/// ledger boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Verdict,
    pub reason_code: Option<ReasonCode>,
    pub message: String,
    pub next_action: Option<String>,
}

impl Outcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            status: Verdict::Pass,
            reason_code: None,
            message: message.into(),
            next_action: None,
        }
    }

    pub fn blocked(reason_code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            status: Verdict::Blocked,
            reason_code: Some(reason_code),
            message: message.into(),
            next_action: Some(reason_code.next_action().to_string()),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }
}

impl From<&LedgerError> for Outcome {
    fn from(error: &LedgerError) -> Self {
        Outcome::blocked(error.reason_code(), error.to_string())
    }
}

impl From<LedgerError> for Outcome {
    fn from(error: LedgerError) -> Self {
        Outcome::from(&error)
    }
}
