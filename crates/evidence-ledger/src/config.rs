//! Ledger configuration.

use std::path::Path;

use evidence_ledger_core::{validate_relative_path, OutputRegistry, ScopeSpec};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Where each ledger artifact is written, root-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    pub checksums: String,
    pub merkle_root: String,
    pub receipt_chain: String,
    pub integrity: String,
    pub machine: String,
    pub integrity_machine: String,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            checksums: "reports/ledger/CHECKSUMS.md".into(),
            merkle_root: "reports/ledger/MERKLE_ROOT.md".into(),
            receipt_chain: "reports/ledger/RECEIPT_CHAIN.md".into(),
            integrity: "reports/ledger/INTEGRITY.md".into(),
            machine: "reports/ledger/ledger.json".into(),
            integrity_machine: "reports/ledger/integrity.json".into(),
        }
    }
}

impl OutputPaths {
    /// `(owner, path)` for every artifact.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("checksums", self.checksums.as_str()),
            ("merkle_root", self.merkle_root.as_str()),
            ("receipt_chain", self.receipt_chain.as_str()),
            ("integrity", self.integrity.as_str()),
            ("machine", self.machine.as_str()),
            ("integrity_machine", self.integrity_machine.as_str()),
        ]
    }

    /// Declare every artifact in a fresh registry.
    ///
    /// Fails if a path is invalid or two artifacts share a path.
    pub fn registry(&self) -> Result<OutputRegistry> {
        let mut registry = OutputRegistry::new();
        for (owner, path) in self.entries() {
            if path.trim().is_empty() {
                return Err(LedgerError::Config(format!("empty output path for {owner}")));
            }
            registry
                .declare(owner, path)
                .map_err(|e| LedgerError::Config(e.to_string()))?;
        }
        Ok(registry)
    }
}

/// Configuration for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Which files are evidence.
    pub scope: ScopeSpec,
    /// Where artifacts go. Always excluded from scope.
    pub outputs: OutputPaths,
    /// Hex characters shown for hashes in human reports.
    pub display_prefix_len: usize,
    /// Compare against the prior checksums report file by file.
    pub verify_per_file: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            scope: ScopeSpec::default(),
            outputs: OutputPaths::default(),
            display_prefix_len: 16,
            verify_per_file: true,
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.display_prefix_len == 0 || self.display_prefix_len > 64 {
            return Err(LedgerError::Config(format!(
                "display_prefix_len must be in 1..=64, got {}",
                self.display_prefix_len
            )));
        }

        self.scope
            .validate()
            .map_err(|e| LedgerError::Config(e.to_string()))?;

        let registry = self.outputs.registry()?;
        for file in &self.scope.files {
            validate_relative_path(file).map_err(|e| LedgerError::Config(e.to_string()))?;
            if let Some(owner) = registry.owner_of(file) {
                return Err(LedgerError::Config(format!(
                    "{file} is the {owner} output and cannot be listed as evidence"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_ledger_core::ScopeRule;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.display_prefix_len, 16);
        assert!(config.verify_per_file);
        assert_eq!(config.outputs.merkle_root, "reports/ledger/MERKLE_ROOT.md");
        assert_eq!(config.outputs.registry().unwrap().len(), 6);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_partial() {
        let config = LedgerConfig::from_json_str(
            r#"{
                "scope": {
                    "rules": [{"dir": "reports", "extensions": ["md"]}],
                    "files": ["STATUS.md"]
                },
                "display_prefix_len": 12
            }"#,
        )
        .unwrap();

        assert_eq!(config.scope.rules, vec![ScopeRule::new("reports").with_extensions(&["md"])]);
        assert_eq!(config.scope.files, vec!["STATUS.md".to_string()]);
        assert_eq!(config.display_prefix_len, 12);
        assert_eq!(config.outputs, OutputPaths::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"verify_per_file": false}"#).unwrap();
        let config = LedgerConfig::from_json_file(&path).unwrap();
        assert!(!config.verify_per_file);

        assert!(LedgerConfig::from_json_file(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_rejects_output_as_evidence() {
        let mut config = LedgerConfig::default();
        config.scope.files.push("reports/ledger/CHECKSUMS.md".into());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_rejects_shared_output_path() {
        let mut config = LedgerConfig::default();
        config.outputs.integrity = config.outputs.checksums.clone();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.outputs.machine = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_prefix_len() {
        let config = LedgerConfig {
            display_prefix_len: 0,
            ..LedgerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
