//! Store trait: the abstract interface over an evidence tree.
//!
//! The ledger never touches the filesystem directly. Every path it sees is a
//! POSIX-style, root-relative string; implementations translate to whatever
//! backs them. `FsStore` serves a repository checkout, `MemoryStore` serves
//! tests.

use bytes::Bytes;
use evidence_ledger_core::{EvidenceFile, FileRecord, RuleSet};

use crate::error::{Result, StoreError};

/// Read/write access to an evidence tree.
///
/// # Design Notes
///
/// - **Regular files only**: `list_files` and `is_file` ignore directories
///   and symlinks.
/// - **No ordering**: `list_files` returns paths in any order. Ordering is
///   the scope manifest's job and happens exactly once.
/// - **Absent is an error**: `read` on a missing path returns
///   [`StoreError::NotFound`], never an empty buffer.
pub trait EvidenceStore: Send + Sync {
    /// Regular files under `dir`, as root-relative paths.
    ///
    /// `dir` is root-relative; `""` is the root. With `recursive == false`
    /// only direct children are returned. A missing `dir` yields an empty
    /// list.
    fn list_files(&self, dir: &str, recursive: bool) -> Result<Vec<String>>;

    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &str) -> Result<bool>;

    /// Bytes of `path`, exactly as stored.
    fn read(&self, path: &str) -> Result<Bytes>;

    /// Create or replace `path`, creating parent directories as needed.
    fn write(&self, path: &str, contents: &[u8]) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait EvidenceStoreExt: EvidenceStore {
    /// Read `path` as an [`EvidenceFile`].
    fn read_evidence(&self, path: &str) -> Result<EvidenceFile> {
        let bytes = self.read(path)?;
        Ok(EvidenceFile::new(path, bytes.to_vec()))
    }

    /// Read and dual-hash `path`.
    fn hash_file(&self, path: &str, rules: &RuleSet) -> Result<FileRecord> {
        Ok(self.read_evidence(path)?.to_record(rules))
    }

    /// Read `path` as lossy UTF-8 text, or `None` if it does not exist.
    fn read_text_opt(&self, path: &str) -> Result<Option<String>> {
        match self.read(path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<S: EvidenceStore + ?Sized> EvidenceStoreExt for S {}
