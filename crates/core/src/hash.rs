//! Content hashing.
//!
//! Every identifier in Depot is a BLAKE3 digest rendered as 64 lowercase hex
//! characters. Chunk hashes cover raw chunk bytes; CIDs and Merkle nodes cover
//! the *hex text* of other hashes, concatenated without a separator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a digest in bytes.
pub const HASH_LEN: usize = 32;

/// Length of a digest rendered as hex.
pub const HEX_LEN: usize = HASH_LEN * 2;

/// A BLAKE3 content hash represented as 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Compute the hash of data.
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create an incremental hasher.
    pub fn hasher() -> ContentHasher {
        ContentHasher(blake3::Hasher::new())
    }

    /// Parse from hex string. Upper-case input is accepted.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        if s.len() != HEX_LEN {
            return Err(crate::Error::InvalidHash(format!(
                "expected {HEX_LEN} hex chars, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| crate::Error::InvalidHash(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Encode as lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for ContentHash {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::from_hex(s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        Self::from_hex(&s)
    }
}

/// Incremental BLAKE3 hasher.
pub struct ContentHasher(blake3::Hasher);

impl ContentHasher {
    /// Update the hasher with data.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> ContentHash {
        ContentHash(*self.0.finalize().as_bytes())
    }
}

/// Hash a byte slice.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash::compute(data)
}

/// Hash the concatenated text of an ordered list of hex hashes.
///
/// Equivalent to `hash_bytes(hashes.join("").as_bytes())` without building the
/// joined string. The input is hashed exactly as given: no decoding and no case
/// normalization.
pub fn hash_concat<I, S>(hashes: I) -> ContentHash
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = ContentHash::hasher();
    for hash in hashes {
        hasher.update(hash.as_ref().as_bytes());
    }
    hasher.finalize()
}
