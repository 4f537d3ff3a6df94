//! In-memory implementation of the EvidenceStore trait.
//!
//! This is primarily for testing. It has the same path semantics as
//! `FsStore` but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bytes::Bytes;
use evidence_ledger_core::validate_relative_path;

use crate::error::{Result, StoreError};
use crate::traits::EvidenceStore;

/// In-memory store implementation.
///
/// Thread-safe via RwLock. Directories are implicit: a directory exists
/// exactly when some file lives beneath it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, contents)` pairs.
    pub fn with_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let store = Self::new();
        for (path, contents) in files {
            store.write(path.as_ref(), contents.as_ref())?;
        }
        Ok(store)
    }

    /// Delete `path`. Returns whether it existed.
    pub fn remove(&self, path: &str) -> Result<bool> {
        let mut files = self.files.write().map_err(poisoned)?;
        Ok(files.remove(path).is_some())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

impl EvidenceStore for MemoryStore {
    fn list_files(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        let files = self.files.read().map_err(poisoned)?;
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        Ok(files
            .range(prefix.clone()..)
            .map(|(path, _)| path)
            .take_while(|path| path.starts_with(&prefix))
            .filter(|path| recursive || !path[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }

    fn is_file(&self, path: &str) -> Result<bool> {
        let files = self.files.read().map_err(poisoned)?;
        Ok(files.contains_key(path))
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let files = self.files.read().map_err(poisoned)?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        validate_relative_path(path)?;
        let mut files = self.files.write().map_err(poisoned)?;
        files.insert(path.to_string(), Bytes::copy_from_slice(contents));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::EvidenceStoreExt;
    use evidence_ledger_core::{RuleSet, Sha256Hash};

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        store.write("reports/a.md", b"alpha").unwrap();

        assert!(store.is_file("reports/a.md").unwrap());
        assert!(!store.is_file("reports").unwrap());
        assert_eq!(&store.read("reports/a.md").unwrap()[..], b"alpha");
        assert!(store.read("reports/b.md").unwrap_err().is_not_found());
        assert_eq!(store.read_text_opt("nope.md").unwrap(), None);
    }

    #[test]
    fn test_memory_store_listing() {
        let store = MemoryStore::with_files([
            ("reports/a.md", "a"),
            ("reports/deep/b.md", "b"),
            ("reportsx/c.md", "c"),
            ("top.md", "t"),
        ])
        .unwrap();

        let mut all = store.list_files("reports", true).unwrap();
        all.sort();
        assert_eq!(all, vec!["reports/a.md", "reports/deep/b.md"]);
        assert_eq!(store.list_files("reports", false).unwrap(), vec!["reports/a.md"]);
        assert_eq!(store.list_files("", false).unwrap(), vec!["top.md"]);
        assert!(store.list_files("missing", true).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_rejects_bad_paths() {
        let store = MemoryStore::new();
        assert!(store.write("/abs.md", b"x").is_err());
        assert!(store.write("a/../b.md", b"x").is_err());
        assert!(store.write("reports/b\nfinal_chain_hash: 0", b"x").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_hash_file_reads_through_evidence_file() {
        let store = MemoryStore::with_files([("reports/gate.md", "STATUS: PASS\r\n")]).unwrap();
        let rules = RuleSet::standard().unwrap();

        let file = store.read_evidence("reports/gate.md").unwrap();
        assert_eq!(file.relative_path, "reports/gate.md");
        assert_eq!(file.raw_bytes, b"STATUS: PASS\r\n");

        let record = store.hash_file("reports/gate.md", &rules).unwrap();
        assert_eq!(record, file.to_record(&rules));
        assert_eq!(record.sha256_raw(), &Sha256Hash::hash(b"STATUS: PASS\r\n"));
        assert_eq!(record.sha256_norm(), &Sha256Hash::hash(b"STATUS: PASS\n"));

        assert!(store.hash_file("reports/gone.md", &rules).unwrap_err().is_not_found());
    }
}
