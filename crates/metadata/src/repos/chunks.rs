//! Chunk repository.

use crate::error::MetadataResult;
use crate::models::ChunkRow;
use async_trait::async_trait;

/// Repository for chunk operations.
#[async_trait]
pub trait ChunkRepo: Send + Sync {
    /// Get a chunk by hash.
    async fn get_chunk_by_hash(&self, chunk_hash: &str) -> MetadataResult<Option<ChunkRow>>;

    /// Check if a chunk exists.
    async fn chunk_exists(&self, chunk_hash: &str) -> MetadataResult<bool>;

    /// Insert a chunk, or return the existing row if the hash is already known.
    ///
    /// The boolean is `true` when this call created the row. Concurrent callers
    /// racing on the same hash observe exactly one `true`.
    async fn insert_chunk_or_get(
        &self,
        chunk_hash: &str,
        size_bytes: i64,
    ) -> MetadataResult<(ChunkRow, bool)>;

    /// Get store-wide chunk statistics.
    async fn get_stats(&self) -> MetadataResult<ChunkStats>;
}

/// Chunk statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Number of unique chunks.
    pub chunk_count: u64,
    /// Bytes held by unique chunks.
    pub stored_bytes: u64,
    /// Number of files.
    pub file_count: u64,
    /// Sum of file sizes, before deduplication.
    pub logical_bytes: u64,
    /// Number of file-to-chunk links.
    pub chunk_references: u64,
}
