//! Scope selection: which files belong to the ledger.
//!
//! The allow-list ([`ScopeSpec`]) is configuration. The exclusion set is
//! not: every component that writes ledger artifacts declares its output
//! paths in an [`OutputRegistry`], and [`select_scope`] subtracts the
//! registry before anything is hashed. That keeps the anchors acyclic: no
//! ledger artifact can ever hash itself or another ledger artifact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::manifest::ScopeManifest;

/// One allow-listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRule {
    /// Root-relative directory. `""` or `"."` is the repository root.
    pub dir: String,
    /// File extensions to keep, without the dot. Empty keeps every file.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Descend into subdirectories.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

impl ScopeRule {
    /// Every file under `dir`, recursively.
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extensions: Vec::new(),
            recursive: true,
        }
    }

    /// Keep only files with one of these extensions.
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Only direct children of `dir`.
    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }

    /// The directory with any `.`/trailing slash removed; `""` is the root.
    pub fn normalized_dir(&self) -> &str {
        let dir = self.dir.trim_end_matches('/');
        if dir == "." {
            ""
        } else {
            dir
        }
    }

    /// Whether a root-relative path falls under this rule.
    pub fn matches(&self, path: &str) -> bool {
        let dir = self.normalized_dir();
        let rest = if dir.is_empty() {
            path
        } else {
            match path.strip_prefix(dir).and_then(|r| r.strip_prefix('/')) {
                Some(rest) => rest,
                None => return false,
            }
        };

        if rest.is_empty() || (!self.recursive && rest.contains('/')) {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }
        let file_name = rest.rsplit('/').next().unwrap_or(rest);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.') == ext),
            _ => false,
        }
    }
}

/// The configured allow-list: directories plus explicitly named files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    #[serde(default)]
    pub rules: Vec<ScopeRule>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl ScopeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: ScopeRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Whether `path` is allow-listed by a rule or named explicitly.
    pub fn allows(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path) || self.rules.iter().any(|r| r.matches(path))
    }

    /// Check every configured path is a clean relative path.
    pub fn validate(&self) -> Result<()> {
        for file in &self.files {
            validate_relative_path(file)?;
        }
        for rule in &self.rules {
            let dir = rule.normalized_dir();
            if !dir.is_empty() {
                validate_relative_path(dir)?;
            }
        }
        Ok(())
    }
}

/// Check that `path` is a clean, POSIX-style, root-relative path.
///
/// Rejects empty paths, absolute paths, backslashes, control characters,
/// empty components and `.`/`..` components. Paths are written one per line
/// into the manifest and the anchor reports.
pub fn validate_relative_path(path: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(CoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return reject("empty path");
    }
    if path.starts_with('/') {
        return reject("absolute path");
    }
    if path.contains('\\') {
        return reject("backslash separator");
    }
    if path.chars().any(char::is_control) {
        return reject("control character");
    }
    for component in path.split('/') {
        match component {
            "" => return reject("empty component"),
            "." | ".." => return reject("relative component"),
            _ => {}
        }
    }
    Ok(())
}

/// Paths written by the ledger itself, keyed by path, valued by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRegistry {
    outputs: BTreeMap<String, String>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `owner` writes `path`.
    ///
    /// Re-declaring a path for the same owner is a no-op. Two owners may not
    /// claim the same path.
    pub fn declare(&mut self, owner: &str, path: &str) -> Result<()> {
        validate_relative_path(path)?;
        match self.outputs.get(path) {
            Some(existing) if existing != owner => Err(CoreError::InvalidPath {
                path: path.to_string(),
                reason: format!("already declared by {existing}"),
            }),
            _ => {
                self.outputs.insert(path.to_string(), owner.to_string());
                Ok(())
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.outputs.contains_key(path)
    }

    pub fn owner_of(&self, path: &str) -> Option<&str> {
        self.outputs.get(path).map(String::as_str)
    }

    /// Declared paths in byte-wise order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Build the scope manifest from candidate paths.
///
/// Keeps candidates `spec` allows, drops every registered ledger output,
/// then sorts byte-wise and deduplicates.
pub fn select_scope<I>(candidates: I, spec: &ScopeSpec, registry: &OutputRegistry) -> ScopeManifest
where
    I: IntoIterator<Item = String>,
{
    ScopeManifest::from_paths(
        candidates
            .into_iter()
            .filter(|path| spec.allows(path) && !registry.contains(path)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matching() {
        let rule = ScopeRule::new("reports").with_extensions(&["md", ".json"]);
        assert!(rule.matches("reports/a.md"));
        assert!(rule.matches("reports/nested/b.json"));
        assert!(!rule.matches("reports/c.txt"));
        assert!(!rule.matches("reports.md"));
        assert!(!rule.matches("reportsx/a.md"));
        assert!(!rule.matches("reports/.md"));

        let flat = ScopeRule::new("reports/").non_recursive();
        assert!(flat.matches("reports/a.md"));
        assert!(!flat.matches("reports/nested/b.md"));

        let root = ScopeRule::new(".").with_extensions(&["md"]).non_recursive();
        assert!(root.matches("README.md"));
        assert!(!root.matches("docs/README.md"));
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("reports/a.md").is_ok());
        for bad in [
            "",
            "/etc/passwd",
            "a\\b",
            "a//b",
            "./a",
            "a/../b",
            "a/",
            "a\nb",
            "reports/b\nfinal_chain_hash: 0",
            "tab\there",
            "cr\r",
        ] {
            assert!(validate_relative_path(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_registry_conflicts() {
        let mut registry = OutputRegistry::new();
        registry.declare("checksums", "reports/ledger/CHECKSUMS.md").unwrap();
        registry.declare("checksums", "reports/ledger/CHECKSUMS.md").unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry
            .declare("merkle", "reports/ledger/CHECKSUMS.md")
            .is_err());
        assert_eq!(registry.owner_of("reports/ledger/CHECKSUMS.md"), Some("checksums"));
    }

    #[test]
    fn test_select_scope_excludes_outputs_and_sorts() {
        let spec = ScopeSpec::new().rule(ScopeRule::new("reports"));
        let mut registry = OutputRegistry::new();
        registry.declare("merkle", "reports/ledger/MERKLE_ROOT.md").unwrap();

        let manifest = select_scope(
            vec![
                "reports/b.md".to_string(),
                "reports/ledger/MERKLE_ROOT.md".to_string(),
                "reports/B.md".to_string(),
                "reports/a.md".to_string(),
                "reports/a.md".to_string(),
                "other/x.md".to_string(),
            ],
            &spec,
            &registry,
        );

        assert_eq!(
            manifest.paths(),
            &["reports/B.md", "reports/a.md", "reports/b.md"]
        );
    }
}
