//! A computed view of the evidence tree: every file's hash pair and the
//! three aggregates derived from them.

use evidence_ledger_core::{
    ChainHead, FileRecord, HashPair, InclusionProof, MerkleRoot, MerkleTree, ReceiptChain,
    RuleSet, ScopeManifest, Sha256Hash,
};
use tracing::debug;

use crate::anchor::CheckId;

/// Everything one pass of collect → hash → aggregate produces.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    manifest: ScopeManifest,
    records: Vec<FileRecord>,
    chain: ReceiptChain,
    tree: MerkleTree,
    rules_version: String,
    rules_sha: Sha256Hash,
}

impl LedgerSnapshot {
    /// Hash every path in `manifest`, in manifest order, and derive the
    /// aggregates.
    ///
    /// `hash_of` is called exactly once per path. The first error aborts.
    pub fn compute<E, F>(manifest: ScopeManifest, rules: &RuleSet, mut hash_of: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<HashPair, E>,
    {
        let mut records = Vec::with_capacity(manifest.len());
        for path in manifest.paths() {
            records.push(FileRecord::new(path.as_str(), hash_of(path)?));
        }

        let chain = ReceiptChain::from_records(&records);
        let tree = MerkleTree::from_records(&records);
        let snapshot = Self {
            manifest,
            records,
            chain,
            tree,
            rules_version: rules.version().to_string(),
            rules_sha: rules.rules_sha(),
        };
        debug!(
            files = snapshot.file_count(),
            scope_manifest_sha = %snapshot.scope_manifest_sha().short(12),
            merkle_root = %snapshot.merkle_root(),
            final_chain_hash = %snapshot.final_chain_hash(),
            "computed ledger aggregates"
        );
        Ok(snapshot)
    }

    pub fn manifest(&self) -> &ScopeManifest {
        &self.manifest
    }

    /// Records in scope order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn record(&self, path: &str) -> Option<&FileRecord> {
        self.records
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn chain(&self) -> &ReceiptChain {
        &self.chain
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn file_count(&self) -> usize {
        self.records.len()
    }

    pub fn rules_version(&self) -> &str {
        &self.rules_version
    }

    pub fn rules_sha(&self) -> Sha256Hash {
        self.rules_sha
    }

    pub fn scope_manifest_sha(&self) -> Sha256Hash {
        self.manifest.manifest_sha()
    }

    pub fn merkle_root(&self) -> MerkleRoot {
        self.tree.root()
    }

    pub fn final_chain_hash(&self) -> ChainHead {
        self.chain.head()
    }

    /// The recomputed value for one integrity check, as it would be anchored.
    pub fn aggregate(&self, check: CheckId) -> String {
        match check {
            CheckId::ScopeManifestSha => self.scope_manifest_sha().to_hex(),
            CheckId::MerkleRoot => self.merkle_root().to_string(),
            CheckId::FinalChainHash => self.final_chain_hash().to_string(),
        }
    }

    /// Stable digest of the whole snapshot for downstream consumers.
    ///
    /// `sha256` of four `key: value` lines: the three aggregates and
    /// `norm_rules_sha`.
    pub fn fingerprint(&self) -> Sha256Hash {
        let mut text = String::new();
        for check in CheckId::ALL {
            text.push_str(&format!("{}: {}\n", check.as_str(), self.aggregate(check)));
        }
        text.push_str(&format!("norm_rules_sha: {}\n", self.rules_sha));
        Sha256Hash::hash(text.as_bytes())
    }

    /// Inclusion proof for `path` against [`merkle_root`](Self::merkle_root).
    pub fn proof(&self, path: &str) -> Option<InclusionProof> {
        let index = self
            .records
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .ok()?;
        self.tree.proof(index)
    }
}
