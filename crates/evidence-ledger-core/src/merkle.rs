//! Binary Merkle tree over evidence files.
//!
//! - Leaf: `sha256(path + ":" + sha256_norm)`.
//! - Parent: `sha256(left_hex + right_hex)`.
//! - A level with an odd number of nodes pairs its last node with itself.
//! - Zero leaves: root is the sentinel `EMPTY`. One leaf: root is the leaf.
//!
//! The chain detects reordering; the tree supports proving that a single
//! file is part of an anchored scope without replaying every other file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::hash::Sha256Hash;
use crate::types::FileRecord;

/// Root value of a zero-leaf tree.
pub const EMPTY_ROOT: &str = "EMPTY";

/// A Merkle root, or the empty sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MerkleRoot {
    Empty,
    Node(Sha256Hash),
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerkleRoot::Empty => f.write_str(EMPTY_ROOT),
            MerkleRoot::Node(hash) => write!(f, "{hash}"),
        }
    }
}

impl FromStr for MerkleRoot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EMPTY_ROOT {
            Ok(MerkleRoot::Empty)
        } else {
            Sha256Hash::from_hex(s).map(MerkleRoot::Node)
        }
    }
}

impl Serialize for MerkleRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MerkleRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `sha256(path + ":" + sha256_norm_hex)`.
pub fn leaf_hash(path: &str, sha256_norm: &Sha256Hash) -> Sha256Hash {
    Sha256Hash::hash_parts(&[path, ":", &sha256_norm.to_hex()])
}

/// `sha256(left_hex + right_hex)`.
pub fn parent_hash(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    Sha256Hash::hash_parts(&[&left.to_hex(), &right.to_hex()])
}

/// A fully materialized tree. `levels[0]` are the leaves; the last level
/// holds the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Sha256Hash>>,
}

impl MerkleTree {
    /// Build from precomputed leaf hashes, in scope order.
    pub fn from_leaves(leaves: Vec<Sha256Hash>) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves];
        while let Some(level) = levels.last() {
            if level.len() <= 1 {
                break;
            }
            let next: Vec<Sha256Hash> = level
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    parent_hash(left, right)
                })
                .collect();
            levels.push(next);
        }

        Self { levels }
    }

    /// Build from file records, in scope order.
    pub fn from_records(records: &[FileRecord]) -> Self {
        Self::from_leaves(
            records
                .iter()
                .map(|r| leaf_hash(&r.path, r.sha256_norm()))
                .collect(),
        )
    }

    pub fn root(&self) -> MerkleRoot {
        self.levels
            .last()
            .and_then(|level| level.first())
            .map_or(MerkleRoot::Empty, |root| MerkleRoot::Node(*root))
    }

    pub fn leaves(&self) -> &[Sha256Hash] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Inclusion proof for the leaf at `index`, or `None` if out of range.
    pub fn proof(&self, index: usize) -> Option<InclusionProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut steps = Vec::with_capacity(self.height());
        let mut position = index;
        for level in &self.levels[..self.height()] {
            let step = if position % 2 == 0 {
                // Last node of an odd level is its own sibling.
                let sibling = level.get(position + 1).unwrap_or(&level[position]);
                ProofStep {
                    sibling: *sibling,
                    side: Side::Right,
                }
            } else {
                ProofStep {
                    sibling: level[position - 1],
                    side: Side::Left,
                }
            };
            steps.push(step);
            position /= 2;
        }

        Some(InclusionProof {
            leaf_index: index,
            leaf_count: self.leaf_count(),
            steps,
        })
    }
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Sha256Hash,
    pub side: Side,
}

/// Path from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf_count: usize,
    pub steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Check the proof is structurally consistent with its claimed position.
    ///
    /// The number of steps and each step's side are fully determined by
    /// `leaf_index` and `leaf_count`; a proof that disagrees was not produced
    /// by [`MerkleTree::proof`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.leaf_index >= self.leaf_count {
            return Err(CoreError::InvalidProof(format!(
                "leaf index {} out of range for {} leaves",
                self.leaf_index, self.leaf_count
            )));
        }

        let mut position = self.leaf_index;
        let mut width = self.leaf_count;
        let mut expected = Vec::new();
        while width > 1 {
            expected.push(if position % 2 == 0 { Side::Right } else { Side::Left });
            position /= 2;
            width = width.div_ceil(2);
        }

        if expected.len() != self.steps.len() {
            return Err(CoreError::InvalidProof(format!(
                "expected {} steps, found {}",
                expected.len(),
                self.steps.len()
            )));
        }
        if let Some(level) = expected
            .iter()
            .zip(&self.steps)
            .position(|(side, step)| *side != step.side)
        {
            return Err(CoreError::InvalidProof(format!("wrong sibling side at level {level}")));
        }
        Ok(())
    }

    /// Root implied by `leaf` and this proof.
    pub fn compute_root(&self, leaf: &Sha256Hash) -> Sha256Hash {
        self.steps.iter().fold(*leaf, |acc, step| match step.side {
            Side::Right => parent_hash(&acc, &step.sibling),
            Side::Left => parent_hash(&step.sibling, &acc),
        })
    }
}

/// Check that `leaf` is committed to by `root` via `proof`.
///
/// An `EMPTY` root includes nothing.
pub fn verify_inclusion(leaf: &Sha256Hash, proof: &InclusionProof, root: &MerkleRoot) -> bool {
    match root {
        MerkleRoot::Empty => false,
        MerkleRoot::Node(expected) => proof.compute_root(leaf) == *expected,
    }
}

/// Compute the root over `paths` in the given order, looking up each
/// normalized hash with `norm_of`.
pub fn merkle_root<S, E, F>(paths: &[S], mut norm_of: F) -> Result<MerkleRoot, E>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Result<Sha256Hash, E>,
{
    let mut leaves = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        leaves.push(leaf_hash(path, &norm_of(path)?));
    }
    Ok(MerkleTree::from_leaves(leaves).root())
}
