//! Filesystem implementation of the EvidenceStore trait.
//!
//! Serves a repository checkout rooted at a directory. Paths crossing the
//! trait boundary are always `/`-separated and relative to that root, on
//! every platform.

use std::fs;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};
use walkdir::WalkDir;

use evidence_ledger_core::validate_relative_path;

use crate::error::{Result, StoreError};
use crate::traits::EvidenceStore;

/// Filesystem-backed store.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`.
    ///
    /// The root must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let display = root.display().to_string();
        let meta = fs::metadata(&root).map_err(|e| StoreError::io(&display, e))?;
        if !meta.is_dir() {
            return Err(StoreError::InvalidPath {
                path: display,
                reason: "store root is not a directory".into(),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a root-relative path.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_relative_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, c| acc.join(c)))
    }

    /// Root-relative POSIX form of `path`, or `None` for non-UTF-8 names.
    fn relativize(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(name) => parts.push(name.to_str()?),
                _ => return None,
            }
        }
        Some(parts.join("/"))
    }
}

impl EvidenceStore for FsStore {
    fn list_files(&self, dir: &str, recursive: bool) -> Result<Vec<String>> {
        let base = if dir.is_empty() {
            self.root.clone()
        } else {
            self.resolve(dir)?
        };
        if !base.is_dir() {
            debug!(dir, "scope directory absent");
            return Ok(Vec::new());
        }

        let mut walker = WalkDir::new(&base).min_depth(1).follow_links(false);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| StoreError::Walk {
                path: dir.to_string(),
                reason: e.to_string(),
            })?;
            // Symlinks report their own type here since links are not followed.
            if !entry.file_type().is_file() {
                continue;
            }
            match self.relativize(entry.path()) {
                Some(rel) => {
                    // A name that cannot be anchored fails the whole listing.
                    if let Err(e) = validate_relative_path(&rel) {
                        return Err(StoreError::InvalidPath {
                            path: rel,
                            reason: e.to_string(),
                        });
                    }
                    files.push(rel);
                }
                None => warn!(
                    path = %entry.path().display(),
                    "skipping file with non UTF-8 or non-relative path"
                ),
            }
        }
        Ok(files)
    }

    fn is_file(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        match fs::symlink_metadata(&full) {
            Ok(meta) => Ok(meta.file_type().is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let full = self.resolve(path)?;
        let bytes = fs::read(&full).map_err(|e| StoreError::io(path, e))?;
        Ok(Bytes::from(bytes))
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
        }
        fs::write(&full, contents).map_err(|e| StoreError::io(path, e))?;
        debug!(path, bytes = contents.len(), "wrote ledger artifact");
        Ok(())
    }
}
