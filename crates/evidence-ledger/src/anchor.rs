//! Anchored values: what a previous run persisted, read back from its
//! artifacts.
//!
//! Parsing is fail-closed. A missing artifact, a missing line or a key that
//! appears twice with different values all leave the check without an
//! anchor, and a check without an anchor never passes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use evidence_ledger_core::{ChainHead, CoreError, FileRecord, HashPair, MerkleRoot, Sha256Hash};
use evidence_ledger_store::{EvidenceStore, EvidenceStoreExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::OutputPaths;
use crate::error::Result;
use crate::snapshot::LedgerSnapshot;

/// Line key of the manifest anchor in the checksums report.
pub const SCOPE_MANIFEST_KEY: &str = "scope_manifest_sha";
/// Line key of the Merkle anchor in the Merkle report.
pub const MERKLE_ROOT_KEY: &str = "MERKLE_ROOT";
/// Line key of the chain anchor in the receipt chain report.
pub const FINAL_CHAIN_KEY: &str = "final_chain_hash";
pub const NORM_RULES_SHA_KEY: &str = "norm_rules_sha";
pub const NORM_RULES_VERSION_KEY: &str = "norm_rules_version";

/// The three integrity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    ScopeManifestSha,
    MerkleRoot,
    FinalChainHash,
}

impl CheckId {
    /// Every check, in report order.
    pub const ALL: [CheckId; 3] = [
        CheckId::ScopeManifestSha,
        CheckId::MerkleRoot,
        CheckId::FinalChainHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckId::ScopeManifestSha => "scope_manifest_sha",
            CheckId::MerkleRoot => "merkle_root",
            CheckId::FinalChainHash => "final_chain_hash",
        }
    }

    /// Check that `value` has the shape this check's anchor must have.
    pub fn validate(&self, value: &str) -> std::result::Result<(), CoreError> {
        match self {
            CheckId::ScopeManifestSha => Sha256Hash::from_hex(value).map(drop),
            CheckId::MerkleRoot => MerkleRoot::from_str(value).map(drop),
            CheckId::FinalChainHash => ChainHead::from_str(value).map(drop),
        }
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file state recorded by a previous checksums report, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorChecksums {
    pub rules_version: Option<String>,
    pub rules_sha: Option<String>,
    pub records: BTreeMap<String, FileRecord>,
}

impl PriorChecksums {
    pub fn record(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }
}

fn index_records(records: impl IntoIterator<Item = FileRecord>) -> BTreeMap<String, FileRecord> {
    records.into_iter().map(|r| (r.path.clone(), r)).collect()
}

/// Anchored values keyed by check, plus why any are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchors {
    values: BTreeMap<CheckId, String>,
    problems: BTreeMap<CheckId, String>,
    prior: Option<PriorChecksums>,
}

impl Anchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor every check at the values `snapshot` computes.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        let mut anchors = Self::new();
        for check in CheckId::ALL {
            anchors.insert(check, snapshot.aggregate(check));
        }
        anchors.prior = Some(PriorChecksums {
            rules_version: Some(snapshot.rules_version().to_string()),
            rules_sha: Some(snapshot.rules_sha().to_hex()),
            records: index_records(snapshot.records().iter().cloned()),
        });
        anchors
    }

    /// Set an anchored value, clearing any recorded problem.
    pub fn insert(&mut self, check: CheckId, value: impl Into<String>) {
        self.problems.remove(&check);
        self.values.insert(check, value.into());
    }

    /// Drop an anchored value, recording why.
    pub fn remove(&mut self, check: CheckId, problem: impl Into<String>) {
        self.values.remove(&check);
        self.problems.insert(check, problem.into());
    }

    pub fn get(&self, check: CheckId) -> Option<&str> {
        self.values.get(&check).map(String::as_str)
    }

    /// Why `check` has no anchor, if known.
    pub fn problem(&self, check: CheckId) -> Option<&str> {
        self.problems.get(&check).map(String::as_str)
    }

    pub fn prior(&self) -> Option<&PriorChecksums> {
        self.prior.as_ref()
    }

    /// Parse anchors from artifact texts. `None` means the artifact is absent.
    pub fn parse(checksums: Option<&str>, merkle: Option<&str>, chain: Option<&str>) -> Self {
        let mut anchors = Self::new();
        let sources = [
            (CheckId::ScopeManifestSha, checksums, SCOPE_MANIFEST_KEY),
            (CheckId::MerkleRoot, merkle, MERKLE_ROOT_KEY),
            (CheckId::FinalChainHash, chain, FINAL_CHAIN_KEY),
        ];
        for (check, text, key) in sources {
            let Some(text) = text else {
                anchors.remove(check, "anchor artifact is absent");
                continue;
            };
            match field(text, key) {
                Field::Value(value) => anchors.insert(check, value),
                Field::Absent => anchors.remove(check, format!("no {key}: line in artifact")),
                Field::Conflicting => {
                    anchors.remove(check, format!("conflicting {key}: lines in artifact"))
                }
            }
        }
        anchors.prior = checksums.map(parse_prior_checksums);
        anchors
    }

    /// Read and parse the anchor artifacts named by `outputs`.
    ///
    /// Absent artifacts are not an error; they leave their check unanchored.
    /// Any other store failure is.
    pub fn load<S>(store: &S, outputs: &OutputPaths) -> Result<Self>
    where
        S: EvidenceStore + ?Sized,
    {
        let checksums = store.read_text_opt(&outputs.checksums)?;
        let merkle = store.read_text_opt(&outputs.merkle_root)?;
        let chain = store.read_text_opt(&outputs.receipt_chain)?;

        let anchors = Self::parse(checksums.as_deref(), merkle.as_deref(), chain.as_deref());
        for check in CheckId::ALL {
            if let Some(problem) = anchors.problem(check) {
                warn!(check = %check, problem, "anchor unavailable");
            }
        }
        debug!(anchored = anchors.values.len(), "loaded anchors");
        Ok(anchors)
    }
}

enum Field {
    Value(String),
    Absent,
    Conflicting,
}

/// Value of the `key: value` line in `text`. Keys are case-sensitive and
/// must start the line.
fn field(text: &str, key: &str) -> Field {
    let mut found: Option<&str> = None;
    for line in text.lines() {
        let Some(value) = line.strip_prefix(key).and_then(|rest| rest.strip_prefix(':')) else {
            continue;
        };
        let value = value.trim();
        match found {
            Some(existing) if existing != value => return Field::Conflicting,
            _ => found = Some(value),
        }
    }
    match found {
        Some(value) => Field::Value(value.to_string()),
        None => Field::Absent,
    }
}

fn parse_prior_checksums(text: &str) -> PriorChecksums {
    let optional = |key: &str| match field(text, key) {
        Field::Value(value) => Some(value),
        Field::Absent | Field::Conflicting => None,
    };

    let mut records = BTreeMap::new();
    let mut malformed = 0usize;
    for line in text.lines().filter(|l| l.starts_with("| `")) {
        match parse_row(line) {
            Some(record) => {
                records.insert(record.path.clone(), record);
            }
            None => malformed += 1,
        }
    }
    if malformed > 0 {
        warn!(malformed, "ignored malformed rows in prior checksums report");
    }

    PriorChecksums {
        rules_version: optional(NORM_RULES_VERSION_KEY),
        rules_sha: optional(NORM_RULES_SHA_KEY),
        records,
    }
}

/// `` | `path` | raw | norm | ``. Split from the right: the hex cells never
/// contain `|`, the path might.
fn parse_row(line: &str) -> Option<FileRecord> {
    let inner = line.strip_prefix("| ")?.strip_suffix(" |")?;
    let mut cells = inner.rsplitn(3, " | ");
    let norm = Sha256Hash::from_hex(cells.next()?.trim()).ok()?;
    let raw = Sha256Hash::from_hex(cells.next()?.trim()).ok()?;
    let path = cells.next()?.strip_prefix('`')?.strip_suffix('`')?;
    Some(FileRecord {
        path: path.to_string(),
        hashes: HashPair {
            sha256_raw: raw,
            sha256_norm: norm,
        },
    })
}
