//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use depot_core::ChunkHash;
use depot_core::config::RetrievalConfig;
use depot_engine::Engine;
use depot_metadata::SqliteStore;
use depot_signer::{Ed25519ReceiptSigner, KeyPair, ReceiptSigner};
use depot_storage::{ChunkStore, FilesystemBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Filesystem store that counts successful writes per chunk.
pub struct CountingStore {
    inner: FilesystemBackend,
    writes: Mutex<HashMap<ChunkHash, usize>>,
}

impl CountingStore {
    pub async fn new(root: &std::path::Path) -> Self {
        Self {
            inner: FilesystemBackend::new(root).await.unwrap(),
            writes: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &FilesystemBackend {
        &self.inner
    }

    /// Number of times bytes were actually written for `data`'s hash.
    pub fn writes_of(&self, data: &[u8]) -> usize {
        let hash = ChunkHash::compute(data);
        self.writes.lock().unwrap().get(&hash).copied().unwrap_or(0)
    }

    pub fn total_writes(&self) -> usize {
        self.writes.lock().unwrap().values().sum()
    }

    pub fn distinct_blobs(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl ChunkStore for CountingStore {
    async fn has_chunk(&self, hash: &ChunkHash) -> StorageResult<bool> {
        self.inner.has_chunk(hash).await
    }

    async fn write_chunk(&self, hash: &ChunkHash, data: Bytes) -> StorageResult<bool> {
        let written = self.inner.write_chunk(hash, data).await?;
        if written {
            *self.writes.lock().unwrap().entry(*hash).or_default() += 1;
        }
        Ok(written)
    }

    async fn read_chunk(&self, hash: &ChunkHash) -> StorageResult<Bytes> {
        self.inner.read_chunk(hash).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Filesystem store whose `fail_on`-th write (1-based) returns an I/O error.
pub struct FailingStore {
    inner: FilesystemBackend,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingStore {
    pub async fn new(root: &std::path::Path, fail_on: usize) -> Self {
        Self {
            inner: FilesystemBackend::new(root).await.unwrap(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn write_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkStore for FailingStore {
    async fn has_chunk(&self, hash: &ChunkHash) -> StorageResult<bool> {
        self.inner.has_chunk(hash).await
    }

    async fn write_chunk(&self, hash: &ChunkHash, data: Bytes) -> StorageResult<bool> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StorageError::Io(std::io::Error::other("down")));
        }
        self.inner.write_chunk(hash, data).await
    }

    async fn read_chunk(&self, hash: &ChunkHash) -> StorageResult<Bytes> {
        self.inner.read_chunk(hash).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// An engine over a temp-dir filesystem store and an in-memory database.
pub struct TestEngine {
    pub engine: Engine,
    pub store: Arc<CountingStore>,
    pub sqlite: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    pub async fn signed(signer: Ed25519ReceiptSigner) -> Self {
        Self::build(Some(Arc::new(signer))).await
    }

    async fn build(signer: Option<Arc<dyn ReceiptSigner>>) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CountingStore::new(&temp_dir.path().join("chunks")).await);
        let sqlite = Arc::new(SqliteStore::new(":memory:", None).await.unwrap());

        let engine = match signer {
            Some(signer) => Engine::new(store.clone(), sqlite.clone(), signer),
            None => Engine::unsigned(store.clone(), sqlite.clone()),
        };

        Self {
            engine,
            store,
            sqlite,
            _temp_dir: temp_dir,
        }
    }

    pub fn with_verification(mut self) -> Self {
        self.engine = self
            .engine
            .with_retrieval_config(RetrievalConfig { verify_chunks: true });
        self
    }
}

pub fn test_signer(name: &str) -> Ed25519ReceiptSigner {
    Ed25519ReceiptSigner::new(KeyPair::from_seed(name, &[7u8; 32]))
}
