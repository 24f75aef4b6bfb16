//! File content identifiers.

use crate::chunk::ChunkHash;
use crate::hash::{ContentHash, hash_concat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A content identifier: the hash of the concatenated hex chunk hashes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(ContentHash);

impl Cid {
    /// Compute the CID from ordered chunk hashes.
    pub fn compute(chunk_hashes: &[ChunkHash]) -> Self {
        Self(hash_concat(chunk_hashes.iter().map(ChunkHash::to_hex)))
    }

    /// Get the underlying content hash.
    pub fn content_hash(&self) -> &ContentHash {
        &self.0
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        Ok(Self(ContentHash::from_hex(s)?))
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Cid {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_hex(s)
    }
}
