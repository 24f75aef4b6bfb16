//! Local filesystem storage backend.
//!
//! Layout: `root/<first two hex chars>/<full hash>`, one file of raw bytes
//! per chunk.

use crate::error::{StorageError, StorageResult};
use crate::traits::ChunkStore;
use async_trait::async_trait;
use bytes::Bytes;
use depot_core::ChunkHash;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Local filesystem chunk store.
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path at which a chunk is stored.
    pub fn chunk_path(&self, hash: &ChunkHash) -> PathBuf {
        self.root.join(hash.shard()).join(hash.to_hex())
    }

    fn not_found(hash: &ChunkHash) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
        move |e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(hash.to_hex())
            } else {
                StorageError::Io(e)
            }
        }
    }
}

#[async_trait]
impl ChunkStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn has_chunk(&self, hash: &ChunkHash) -> StorageResult<bool> {
        fs::try_exists(self.chunk_path(hash))
            .await
            .map_err(StorageError::Io)
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn write_chunk(&self, hash: &ChunkHash, data: Bytes) -> StorageResult<bool> {
        let path = self.chunk_path(hash);

        // Concurrent writers of the same hash both rename identical bytes
        // into place; the last rename wins and the content is unchanged.
        if fs::try_exists(&path).await.map_err(StorageError::Io)? {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_file_name(format!("{}.tmp.{}", hash.to_hex(), Uuid::new_v4()));
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            // Best effort: the temp file is garbage either way.
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        Ok(true)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_chunk(&self, hash: &ChunkHash) -> StorageResult<Bytes> {
        let data = fs::read(self.chunk_path(hash))
            .await
            .map_err(Self::not_found(hash))?;
        Ok(Bytes::from(data))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}
