//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use depot_core::ChunkHash;

/// Content-addressed chunk store.
///
/// Chunks are keyed by the hash of their bytes, so a write for a hash that is
/// already present is a no-op.
#[async_trait]
pub trait ChunkStore: Send + Sync + 'static {
    /// Check if a chunk exists.
    async fn has_chunk(&self, hash: &ChunkHash) -> StorageResult<bool>;

    /// Write a chunk unless it is already present.
    ///
    /// Returns `true` when bytes were written and `false` when the chunk
    /// already existed.
    async fn write_chunk(&self, hash: &ChunkHash, data: Bytes) -> StorageResult<bool>;

    /// Read a chunk's bytes. Returns `StorageError::NotFound` if absent.
    async fn read_chunk(&self, hash: &ChunkHash) -> StorageResult<Bytes>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "s3", "filesystem").
    /// Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends that
    /// don't require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
