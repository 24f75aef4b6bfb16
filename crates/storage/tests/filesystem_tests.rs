// Filesystem backend behaviour under concurrent and repeated writes.

mod common;

use common::seeded_bytes;
use depot_core::ChunkHash;
use depot_storage::{ChunkStore, FilesystemBackend, StorageError};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_concurrent_writes_of_same_chunk() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(FilesystemBackend::new(temp_dir.path()).await.unwrap());

    let data = seeded_bytes(7, 64 * 1024);
    let hash = ChunkHash::compute(&data);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let backend = backend.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move {
            backend.write_chunk(&hash, data).await.unwrap()
        }));
    }

    let mut wrote = 0;
    for handle in handles {
        if handle.await.unwrap() {
            wrote += 1;
        }
    }
    assert!(wrote >= 1, "at least one writer should store the chunk");

    assert_eq!(backend.read_chunk(&hash).await.unwrap(), data);

    // Only the final object remains in the shard directory.
    let entries = std::fs::read_dir(temp_dir.path().join(hash.shard()))
        .unwrap()
        .count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_many_distinct_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();

    let mut hashes = Vec::new();
    for seed in 0..50 {
        let data = seeded_bytes(seed, 512);
        let hash = ChunkHash::compute(&data);
        assert!(backend.write_chunk(&hash, data).await.unwrap());
        hashes.push((seed, hash));
    }

    for (seed, hash) in hashes {
        assert_eq!(backend.read_chunk(&hash).await.unwrap(), seeded_bytes(seed, 512));
    }
}

#[tokio::test]
async fn test_empty_chunk_is_storable() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();

    let hash = ChunkHash::compute(b"");
    assert!(backend.write_chunk(&hash, bytes::Bytes::new()).await.unwrap());
    assert!(backend.read_chunk(&hash).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reopen_sees_existing_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let data = seeded_bytes(1, 100);
    let hash = ChunkHash::compute(&data);

    {
        let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();
        backend.write_chunk(&hash, data.clone()).await.unwrap();
    }

    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();
    assert!(backend.has_chunk(&hash).await.unwrap());
    assert!(!backend.write_chunk(&hash, data).await.unwrap());
}

#[tokio::test]
async fn test_deleted_object_reads_as_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();

    let data = seeded_bytes(3, 10);
    let hash = ChunkHash::compute(&data);
    backend.write_chunk(&hash, data).await.unwrap();
    std::fs::remove_file(backend.chunk_path(&hash)).unwrap();

    assert!(matches!(
        backend.read_chunk(&hash).await,
        Err(StorageError::NotFound(_))
    ));
}
