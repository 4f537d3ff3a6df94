//! The scope manifest and `SCOPE_MANIFEST_SHA`.
//!
//! The manifest is the single source of ordering truth for a run: the
//! receipt chain and the Merkle tree both consume its path order, so it is
//! computed once and passed by reference, never re-sorted downstream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::hash::Sha256Hash;

/// Paths in scope, sorted byte-wise ascending and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeManifest {
    paths: Vec<String>,
}

/// Membership difference between two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl ScopeManifest {
    /// Sort and deduplicate `paths`.
    ///
    /// `String`'s `Ord` compares UTF-8 bytes, so the order is the same on
    /// every platform and locale.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = paths.into_iter().map(Into::into).collect();
        Self {
            paths: set.into_iter().collect(),
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths
            .binary_search_by(|p| p.as_str().cmp(path))
            .is_ok()
    }

    /// `SCOPE_MANIFEST_SHA` of this manifest.
    pub fn manifest_sha(&self) -> Sha256Hash {
        manifest_sha(&self.paths)
    }

    /// Paths in `self` but not `previous` (added) and vice versa (removed).
    pub fn diff(&self, previous: &ScopeManifest) -> ManifestDiff {
        ManifestDiff {
            added: self
                .paths
                .iter()
                .filter(|p| !previous.contains(p))
                .cloned()
                .collect(),
            removed: previous
                .paths
                .iter()
                .filter(|p| !self.contains(p))
                .cloned()
                .collect(),
        }
    }
}

/// `sha256(join(paths, "\n") + "\n")`.
///
/// `paths` must already be in scope order; this function does not sort.
/// An empty list hashes the single newline.
pub fn manifest_sha<S: AsRef<str>>(paths: &[S]) -> Sha256Hash {
    let mut text = String::new();
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(path.as_ref());
    }
    text.push('\n');
    Sha256Hash::hash(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_hex;

    #[test]
    fn test_manifest_sha_formula() {
        let manifest = ScopeManifest::from_paths(["f3", "f1", "f2"]);
        assert_eq!(manifest.paths(), &["f1", "f2", "f3"]);
        assert_eq!(manifest.manifest_sha().to_hex(), sha256_hex(b"f1\nf2\nf3\n"));
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = ScopeManifest::default();
        assert_eq!(manifest.manifest_sha().to_hex(), sha256_hex(b"\n"));
    }

    #[test]
    fn test_byte_order_not_locale_order() {
        let manifest = ScopeManifest::from_paths(["b", "a", "B", "_", "Z", "é"]);
        assert_eq!(manifest.paths(), &["B", "Z", "_", "a", "b", "é"]);
    }

    #[test]
    fn test_membership_change_changes_sha() {
        let before = ScopeManifest::from_paths(["f1", "f2"]);
        let after = ScopeManifest::from_paths(["f1", "f2", "f3"]);
        assert_ne!(before.manifest_sha(), after.manifest_sha());

        let diff = after.diff(&before);
        assert_eq!(diff.added, vec!["f3".to_string()]);
        assert!(diff.removed.is_empty());
        assert_eq!(before.diff(&after).removed, vec!["f3".to_string()]);
    }

    #[test]
    fn test_contains() {
        let manifest = ScopeManifest::from_paths(["a/b.md", "a/c.md"]);
        assert!(manifest.contains("a/c.md"));
        assert!(!manifest.contains("a/d.md"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn manifest_ignores_input_order(mut paths in prop::collection::vec("[a-zA-Z0-9_/.]{1,12}", 0..20)) {
                let forward = ScopeManifest::from_paths(paths.clone());
                paths.reverse();
                let reversed = ScopeManifest::from_paths(paths);
                prop_assert_eq!(forward.manifest_sha(), reversed.manifest_sha());
                prop_assert!(forward.paths().windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
