//! Dedup index over the metadata store's chunk table.

use crate::error::EngineResult;
use depot_core::ChunkHash;
use depot_metadata::MetadataStore;
use depot_metadata::models::ChunkRow;
use std::sync::Arc;

/// Answers "is this chunk already stored?" and records newly stored chunks.
///
/// Concurrent recorders of the same hash are reconciled by the store's
/// insert-or-fetch primitive: exactly one row is created and every caller
/// gets it back.
#[derive(Clone)]
pub struct DedupIndex {
    metadata: Arc<dyn MetadataStore>,
}

impl DedupIndex {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    pub async fn exists(&self, hash: &ChunkHash) -> EngineResult<bool> {
        Ok(self.metadata.chunk_exists(&hash.to_hex()).await?)
    }

    pub async fn lookup(&self, hash: &ChunkHash) -> EngineResult<Option<ChunkRow>> {
        Ok(self.metadata.get_chunk_by_hash(&hash.to_hex()).await?)
    }

    /// Record a chunk, returning its row and whether this call created it.
    pub async fn record(&self, hash: &ChunkHash, size: u64) -> EngineResult<(ChunkRow, bool)> {
        let (row, created) = self
            .metadata
            .insert_chunk_or_get(&hash.to_hex(), size as i64)
            .await?;
        if created {
            tracing::debug!(chunk = %hash, size, "recorded new chunk");
        }
        Ok((row, created))
    }
}

impl std::fmt::Debug for DedupIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupIndex").finish_non_exhaustive()
    }
}
