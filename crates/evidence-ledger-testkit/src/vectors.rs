//! Golden test vectors for deterministic verification.
//!
//! Every value here was computed independently with a stock SHA-256 tool
//! and string concatenation. Any implementation of the ledger formulas must
//! reproduce them exactly.

use evidence_ledger_core::{HashPair, RuleSet, ScopeManifest};
use evidence_ledger_store::MemoryStore;

/// A golden scope: input files and the aggregates they must produce.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// `(path, contents)` pairs, in no particular order.
    pub files: &'static [(&'static str, &'static str)],
    /// Expected `SCOPE_MANIFEST_SHA`.
    pub scope_manifest_sha: &'static str,
    /// Expected Merkle root (`EMPTY` for no files).
    pub merkle_root: &'static str,
    /// Expected final chain hash (`GENESIS` for no files).
    pub final_chain_hash: &'static str,
}

impl GoldenVector {
    /// A store holding exactly this vector's files.
    pub fn store(&self) -> anyhow::Result<MemoryStore> {
        Ok(MemoryStore::with_files(self.files.iter().copied())?)
    }

    /// The manifest of this vector's paths.
    pub fn manifest(&self) -> ScopeManifest {
        ScopeManifest::from_paths(self.files.iter().map(|(path, _)| *path))
    }
}

/// Get all golden scope vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "three plain files",
            files: &[("f1", "x\n"), ("f2", "y\n"), ("f3", "z\n")],
            scope_manifest_sha: "4810de467a5efb444e2103bef85548fb3b0a6fb9d8c7799367c0942de3b37e33",
            merkle_root: "329b27daf3663d115f9863d8dc8bf106716fd88bbbb8b8a0dbf4712cae83006a",
            final_chain_hash: "db391920c99a3c14143f29b981a8f858aa81d54ebeb694dbb2dd300091716bc2",
        },
        GoldenVector {
            name: "empty scope",
            files: &[],
            scope_manifest_sha: "01ba4719c80b6fe911b091a7c05124b64eeece964e09c058ef8f9805daca546b",
            merkle_root: "EMPTY",
            final_chain_hash: "GENESIS",
        },
        GoldenVector {
            name: "single report",
            files: &[("reports/gate.md", "STATUS: PASS\n")],
            scope_manifest_sha: "dadaf0bbc4fc5f77aca60c0c92ba47f2da7e3dcd36ac5a44866d0e2a5c546fd1",
            merkle_root: "4327595755a966ee718d69b30226e881bce47995725d0a08e1039b4820f375bc",
            final_chain_hash: "584e4fec1d0251c1b4a481063796c8c7e10739ba1888fd499ffec6a33bc45b9f",
        },
        GoldenVector {
            name: "volatile reports",
            files: &[
                (
                    "reports/gate.md",
                    "STARTED_AT: 2026-01-14T12:00:00Z\nRUN_ID: run-20260114T120000Z-0badcafe\nSTATUS: PASS\n",
                ),
                (
                    "reports/diff.md",
                    "# Diff\n<!-- ledger:volatile -->\n```diff\n-1\n+2\n```\nVERDICT: PASS\r\n",
                ),
            ],
            scope_manifest_sha: "6c912af9e78ff8f75f9e93bc2093cbd6ab0670afbdb8d7b3155782797201b53d",
            merkle_root: "981129b907aa31b29adcc17c40d9ea280ac5cf1bf51ee36f0fce9ea446299b0e",
            final_chain_hash: "7161c6cbd61c6439ebe80555ae4edb5d50bbe0503f7f27754bd8b529590d75b3",
        },
    ]
}

/// A single file's expected hash pair.
#[derive(Debug, Clone)]
pub struct HashVector {
    pub name: &'static str,
    pub raw: &'static str,
    pub sha256_raw: &'static str,
    pub sha256_norm: &'static str,
}

/// Get all dual-hash vectors.
pub fn hash_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "sha256 of abc",
            raw: "abc",
            sha256_raw: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            sha256_norm: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        HashVector {
            name: "timestamp and run id",
            raw: "STARTED_AT: 2026-01-14T12:00:00Z\nRUN_ID: run-20260114T120000Z-0badcafe\nSTATUS: PASS\n",
            sha256_raw: "8c1895aece525b8fb3af6725984b50a4158a3f898681040aef08eead4788b665",
            sha256_norm: "2061312d16dd1680200e1c93575797ac7e44e5fe9d33bd7e98fb291aac80f85a",
        },
        HashVector {
            name: "volatile fence and crlf",
            raw: "# Diff\n<!-- ledger:volatile -->\n```diff\n-1\n+2\n```\nVERDICT: PASS\r\n",
            sha256_raw: "689f607fa75f189d425c88b0c3a0f18b0863154c14dd9cb254b82b028700bb3c",
            sha256_norm: "65f53e76ae6620c7a4c5e95c2f6d585bf74070f13e9e36def0ea107f9f5522fc",
        },
    ]
}

/// Check every hash vector against `rules`. Returns the names that fail.
pub fn verify_hash_vectors(rules: &RuleSet) -> Vec<&'static str> {
    hash_vectors()
        .into_iter()
        .filter(|v| {
            let pair = HashPair::compute(v.raw.as_bytes(), rules);
            pair.sha256_raw.to_hex() != v.sha256_raw || pair.sha256_norm.to_hex() != v.sha256_norm
        })
        .map(|v| v.name)
        .collect()
}
