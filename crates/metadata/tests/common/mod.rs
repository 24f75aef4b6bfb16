//! Metadata store test utilities.

use depot_metadata::models::NewFile;
use depot_metadata::{MetadataResult, MetadataStore, SqliteStore};
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;

/// A test metadata store wrapper that cleans up on drop.
#[allow(dead_code)]
pub struct TestMetadata {
    pub store: Arc<dyn MetadataStore>,
    _temp_dir: Option<TempDir>,
}

#[allow(dead_code)]
impl TestMetadata {
    /// Create a store backed by a database file in a temp directory.
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(temp_dir.path().join("test.db"), Some(5)).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        })
    }

    /// Create a new in-memory SQLite store (faster for tests).
    pub async fn in_memory() -> MetadataResult<Self> {
        let store = SqliteStore::new(":memory:", None).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: None,
        })
    }
}

/// A file row for `cid` declaring `chunk_count` chunks.
#[allow(dead_code)]
pub fn new_file(cid: &str, chunk_count: i64) -> NewFile {
    NewFile {
        cid: cid.to_string(),
        filename: Some(format!("{cid}.bin")),
        mime_type: Some("application/octet-stream".to_string()),
        uploader: None,
        total_size: chunk_count * 3,
        chunk_count,
        merkle_root: format!("root-{cid}"),
        created_at: OffsetDateTime::now_utc(),
    }
}
