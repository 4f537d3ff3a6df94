//! The scope collector: enumerate a store into a [`ScopeManifest`].

use tracing::{debug, warn};

use evidence_ledger_core::{select_scope, OutputRegistry, ScopeManifest, ScopeSpec};

use crate::error::Result;
use crate::traits::EvidenceStore;

/// Enumerate every in-scope regular file in `store`.
///
/// Walks each rule's directory, adds explicitly listed files that exist,
/// removes every path in `registry`, then sorts byte-wise and deduplicates.
/// Call once per run and reuse the result.
pub fn collect<S>(store: &S, spec: &ScopeSpec, registry: &OutputRegistry) -> Result<ScopeManifest>
where
    S: EvidenceStore + ?Sized,
{
    spec.validate()?;

    let mut candidates = Vec::new();
    for rule in &spec.rules {
        let listed = store.list_files(rule.normalized_dir(), rule.recursive)?;
        candidates.extend(listed.into_iter().filter(|p| rule.matches(p)));
    }
    for file in &spec.files {
        if store.is_file(file)? {
            candidates.push(file.clone());
        } else {
            warn!(path = %file, "listed evidence file is absent, leaving it out of scope");
        }
    }

    let manifest = select_scope(candidates, spec, registry);
    debug!(
        files = manifest.len(),
        excluded_outputs = registry.len(),
        "collected evidence scope"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use evidence_ledger_core::ScopeRule;

    fn store() -> MemoryStore {
        MemoryStore::with_files([
            ("reports/gate.md", "g"),
            ("reports/gate.json", "{}"),
            ("reports/notes.txt", "n"),
            ("reports/ledger/CHECKSUMS.md", "c"),
            ("reports/ledger/MERKLE_ROOT.md", "m"),
            ("docs/README.md", "r"),
            ("STATUS.md", "s"),
        ])
        .unwrap()
    }

    #[test]
    fn test_collect_filters_and_excludes_outputs() {
        let spec = ScopeSpec::new()
            .rule(ScopeRule::new("reports").with_extensions(&["md", "json"]))
            .file("STATUS.md")
            .file("MISSING.md");
        let mut registry = OutputRegistry::new();
        registry.declare("checksums", "reports/ledger/CHECKSUMS.md").unwrap();
        registry.declare("merkle", "reports/ledger/MERKLE_ROOT.md").unwrap();

        let manifest = collect(&store(), &spec, &registry).unwrap();
        assert_eq!(
            manifest.paths(),
            &["STATUS.md", "reports/gate.json", "reports/gate.md"]
        );
    }

    #[test]
    fn test_collect_dedups_overlapping_rules() {
        let spec = ScopeSpec::new()
            .rule(ScopeRule::new("reports").with_extensions(&["md"]))
            .rule(ScopeRule::new("").with_extensions(&["md"]))
            .file("docs/README.md");

        let manifest = collect(&store(), &spec, &OutputRegistry::new()).unwrap();
        assert_eq!(
            manifest.paths(),
            &[
                "STATUS.md",
                "docs/README.md",
                "reports/gate.md",
                "reports/ledger/CHECKSUMS.md",
                "reports/ledger/MERKLE_ROOT.md",
            ]
        );
    }

    #[test]
    fn test_collect_rejects_invalid_config() {
        let spec = ScopeSpec::new().file("../outside.md");
        assert!(collect(&store(), &spec, &OutputRegistry::new()).is_err());
    }
}
