//! Stored file descriptors.

use crate::cid::Cid;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Metadata describing an ingested file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Content identifier.
    pub cid: Cid,
    /// Original filename, if one was supplied.
    pub filename: Option<String>,
    /// MIME type, if one was supplied.
    pub mime_type: Option<String>,
    /// Free-form uploader identity.
    pub uploader: Option<String>,
    /// Total size in bytes.
    pub total_size: u64,
    /// Number of chunks (always at least one).
    pub chunk_count: u64,
    /// Merkle root over the ordered chunk hashes.
    pub merkle_root: ContentHash,
    /// When the file was first ingested.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
