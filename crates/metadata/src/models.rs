//! Database row types.

use sqlx::FromRow;
use time::OffsetDateTime;

/// A unique chunk known to the store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ChunkRow {
    pub chunk_id: i64,
    pub chunk_hash: String,
    pub size_bytes: i64,
    pub created_at: OffsetDateTime,
}

/// An ingested file.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileRow {
    pub file_id: i64,
    pub cid: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub uploader: Option<String>,
    pub total_size: i64,
    pub chunk_count: i64,
    pub merkle_root: String,
    pub created_at: OffsetDateTime,
}

/// Fields supplied when creating a file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub cid: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub uploader: Option<String>,
    pub total_size: i64,
    pub chunk_count: i64,
    pub merkle_root: String,
    pub created_at: OffsetDateTime,
}

/// A file-to-chunk link joined with the chunk it points at.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileChunkRow {
    pub position: i64,
    pub chunk_id: i64,
    pub chunk_hash: String,
    pub size_bytes: i64,
}

/// A persisted receipt.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReceiptRow {
    pub receipt_id: i64,
    pub file_id: i64,
    /// `"ingest"` or `"retrieve"`.
    pub receipt_type: String,
    /// Canonical JSON payload.
    pub payload: String,
    pub signature: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields supplied when recording a receipt.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub file_id: i64,
    pub receipt_type: String,
    pub payload: String,
    pub signature: Option<String>,
    pub created_at: OffsetDateTime,
}
