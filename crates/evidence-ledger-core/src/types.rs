//! Evidence files and their dual hashes.
//!
//! Every in-scope file gets two digests: `sha256_raw` over the bytes exactly
//! as read, and `sha256_norm` over the canonicalized text. The raw digest
//! catches any byte change at all; the normalized digest is what the
//! aggregates (chain, Merkle tree) are built from, so that a rerun which
//! only refreshes timestamps reproduces the same ledger.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hash::Sha256Hash;
use crate::normalize::RuleSet;

/// A file as read from the evidence tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    /// POSIX-style, repo-root-relative path. The identity key in a scope.
    pub relative_path: String,
    /// Bytes exactly as read.
    pub raw_bytes: Vec<u8>,
}

impl EvidenceFile {
    pub fn new(relative_path: impl Into<String>, raw_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            relative_path: relative_path.into(),
            raw_bytes: raw_bytes.into(),
        }
    }

    /// Compute this file's hash pair under `rules`.
    pub fn hash_pair(&self, rules: &RuleSet) -> HashPair {
        HashPair::compute(&self.raw_bytes, rules)
    }

    /// Hash and pair with the path.
    pub fn to_record(&self, rules: &RuleSet) -> FileRecord {
        FileRecord::new(self.relative_path.as_str(), self.hash_pair(rules))
    }
}

/// `{sha256_raw, sha256_norm}` for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPair {
    pub sha256_raw: Sha256Hash,
    pub sha256_norm: Sha256Hash,
}

impl HashPair {
    /// Dual-hash raw evidence bytes.
    pub fn compute(raw: &[u8], rules: &RuleSet) -> Self {
        let normalized = rules.normalize_bytes(raw);
        Self {
            sha256_raw: Sha256Hash::hash(raw),
            sha256_norm: Sha256Hash::hash(normalized.as_bytes()),
        }
    }

    /// Whether normalization changed the content.
    pub fn is_normalized_differently(&self) -> bool {
        self.sha256_raw != self.sha256_norm
    }
}

/// A path together with its hash pair, in scope order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(flatten)]
    pub hashes: HashPair,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, hashes: HashPair) -> Self {
        let record = Self {
            path: path.into(),
            hashes,
        };
        debug!(
            path = %record.path,
            raw = %record.hashes.sha256_raw.short(12),
            norm = %record.hashes.sha256_norm.short(12),
            "hashed evidence file"
        );
        record
    }

    pub fn sha256_norm(&self) -> &Sha256Hash {
        &self.hashes.sha256_norm
    }

    pub fn sha256_raw(&self) -> &Sha256Hash {
        &self.hashes.sha256_raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_hex;

    #[test]
    fn test_plain_file_hashes_agree() {
        let rules = RuleSet::standard().unwrap();
        let pair = HashPair::compute(b"x\n", &rules);
        assert_eq!(pair.sha256_raw.to_hex(), sha256_hex(b"x\n"));
        assert_eq!(pair.sha256_raw, pair.sha256_norm);
        assert!(!pair.is_normalized_differently());
    }

    #[test]
    fn test_volatile_file_hashes_diverge() {
        let rules = RuleSet::standard().unwrap();
        let raw = b"STARTED_AT: 2026-01-14T12:00:00Z\nSTATUS: PASS\n";
        let pair = HashPair::compute(raw, &rules);
        assert_eq!(pair.sha256_raw.to_hex(), sha256_hex(raw));
        assert_eq!(
            pair.sha256_norm.to_hex(),
            sha256_hex(b"STARTED_AT: <TIMESTAMP>\nSTATUS: PASS\n")
        );
    }

    #[test]
    fn test_rerun_changes_raw_only() {
        let rules = RuleSet::standard().unwrap();
        let a = EvidenceFile::new("r.md", "STARTED_AT: 2026-01-14T12:00:00Z\nok\n");
        let b = EvidenceFile::new("r.md", "STARTED_AT: 2026-02-01T00:00:00Z\nok\n");
        let (pa, pb) = (a.hash_pair(&rules), b.hash_pair(&rules));
        assert_ne!(pa.sha256_raw, pb.sha256_raw);
        assert_eq!(pa.sha256_norm, pb.sha256_norm);
    }

    #[test]
    fn test_record_serializes_flat() {
        let rules = RuleSet::standard().unwrap();
        let record = EvidenceFile::new("a.md", "x\n").to_record(&rules);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["path"], "a.md");
        assert_eq!(json["sha256_raw"], sha256_hex(b"x\n"));
        assert_eq!(json["sha256_norm"], sha256_hex(b"x\n"));
    }
}
