//! The receipt chain: an order-sensitive fold over normalized hashes.
//!
//! `chain[0] = "GENESIS"`, `chain[i] = sha256(chain[i-1] + ":" + sha256_norm_i)`.
//! Unlike the Merkle root, swapping the processing order of two files
//! changes the final hash even when the file set is identical.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::hash::Sha256Hash;
use crate::types::FileRecord;

/// The seed value of every chain.
pub const GENESIS: &str = "GENESIS";

/// Current value of a chain: the seed, or the last link's hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainHead {
    Genesis,
    Link(Sha256Hash),
}

impl ChainHead {
    /// Fold one normalized hash into the chain.
    pub fn extend(&self, sha256_norm: &Sha256Hash) -> ChainHead {
        let prev = self.to_string();
        ChainHead::Link(Sha256Hash::hash_parts(&[&prev, ":", &sha256_norm.to_hex()]))
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, ChainHead::Genesis)
    }
}

impl fmt::Display for ChainHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainHead::Genesis => f.write_str(GENESIS),
            ChainHead::Link(hash) => write!(f, "{hash}"),
        }
    }
}

impl FromStr for ChainHead {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS {
            Ok(ChainHead::Genesis)
        } else {
            Sha256Hash::from_hex(s).map(ChainHead::Link)
        }
    }
}

impl Serialize for ChainHead {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainHead {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One file's contribution to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    /// 1-based position in scope order.
    pub index: usize,
    pub path: String,
    pub sha256_norm: Sha256Hash,
    /// Chain value after folding this file.
    pub chain_hash: Sha256Hash,
}

/// The full chain, with every intermediate link kept for audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptChain {
    links: Vec<ChainLink>,
}

impl ReceiptChain {
    /// Build the chain over records already in scope order.
    pub fn from_records(records: &[FileRecord]) -> Self {
        let mut head = ChainHead::Genesis;
        let mut links = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            head = head.extend(record.sha256_norm());
            if let ChainHead::Link(chain_hash) = head {
                links.push(ChainLink {
                    index: i + 1,
                    path: record.path.clone(),
                    sha256_norm: *record.sha256_norm(),
                    chain_hash,
                });
            }
        }

        Self { links }
    }

    /// `chain[n]`: `GENESIS` for an empty scope.
    pub fn head(&self) -> ChainHead {
        self.links
            .last()
            .map_or(ChainHead::Genesis, |link| ChainHead::Link(link.chain_hash))
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Fold `paths` in the given order, looking up each normalized hash with
/// `norm_of`.
///
/// The first lookup error aborts the fold; no path is ever skipped.
pub fn fold_chain<S, E, F>(paths: &[S], mut norm_of: F) -> Result<ChainHead, E>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Result<Sha256Hash, E>,
{
    let mut head = ChainHead::Genesis;
    for path in paths {
        head = head.extend(&norm_of(path.as_ref())?);
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_hex;
    use crate::types::HashPair;

    fn record(path: &str, content: &[u8]) -> FileRecord {
        let h = Sha256Hash::hash(content);
        FileRecord::new(
            path,
            HashPair {
                sha256_raw: h,
                sha256_norm: h,
            },
        )
    }

    #[test]
    fn test_empty_chain_is_genesis() {
        let chain = ReceiptChain::from_records(&[]);
        assert_eq!(chain.head(), ChainHead::Genesis);
        assert_eq!(chain.head().to_string(), "GENESIS");
    }

    #[test]
    fn test_chain_formula() {
        let records = vec![record("f1", b"x\n"), record("f2", b"y\n")];
        let chain = ReceiptChain::from_records(&records);

        let c1 = sha256_hex(format!("GENESIS:{}", sha256_hex(b"x\n")).as_bytes());
        let c2 = sha256_hex(format!("{c1}:{}", sha256_hex(b"y\n")).as_bytes());

        assert_eq!(chain.links()[0].chain_hash.to_hex(), c1);
        assert_eq!(chain.head().to_string(), c2);
        assert_eq!(chain.links()[1].index, 2);
    }

    #[test]
    fn test_order_sensitivity() {
        let a = record("a", b"alpha");
        let b = record("b", b"beta");
        let ab = ReceiptChain::from_records(&[a.clone(), b.clone()]);
        let ba = ReceiptChain::from_records(&[b, a]);
        assert_ne!(ab.head(), ba.head());
    }

    #[test]
    fn test_fold_chain_matches_builder() {
        let records = vec![record("f1", b"1"), record("f2", b"2"), record("f3", b"3")];
        let paths: Vec<_> = records.iter().map(|r| r.path.clone()).collect();
        let head = fold_chain(&paths, |p| {
            records
                .iter()
                .find(|r| r.path == p)
                .map(|r| *r.sha256_norm())
                .ok_or_else(|| p.to_string())
        })
        .unwrap();
        assert_eq!(head, ReceiptChain::from_records(&records).head());
    }

    #[test]
    fn test_fold_chain_propagates_lookup_error() {
        let paths = vec!["present", "missing"];
        let result: Result<ChainHead, String> = fold_chain(&paths, |p| {
            if p == "present" {
                Ok(Sha256Hash::hash(b"p"))
            } else {
                Err(p.to_string())
            }
        });
        assert_eq!(result.unwrap_err(), "missing");
    }

    #[test]
    fn test_head_parse_roundtrip() {
        let head: ChainHead = "GENESIS".parse().unwrap();
        assert!(head.is_genesis());

        let link = ChainHead::Link(Sha256Hash::hash(b"z"));
        assert_eq!(link.to_string().parse::<ChainHead>().unwrap(), link);
        assert!("genesis".parse::<ChainHead>().is_err());
    }
}
