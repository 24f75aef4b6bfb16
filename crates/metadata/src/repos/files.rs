//! File repository.

use crate::error::MetadataResult;
use crate::models::{FileChunkRow, FileRow, NewFile};
use async_trait::async_trait;

/// Repository for file operations.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Get a file by CID.
    async fn get_file_by_cid(&self, cid: &str) -> MetadataResult<Option<FileRow>>;

    /// Create a file together with its ordered chunk links.
    ///
    /// `chunk_ids[i]` is linked at position `i`. Everything is written in one
    /// transaction. If a file with the same CID already exists, nothing is
    /// written and the existing row is returned with `false`.
    async fn create_file_with_chunks(
        &self,
        file: &NewFile,
        chunk_ids: &[i64],
    ) -> MetadataResult<(FileRow, bool)>;

    /// Get a file's chunk links ordered by position.
    async fn get_file_chunks(&self, file_id: i64) -> MetadataResult<Vec<FileChunkRow>>;
}
