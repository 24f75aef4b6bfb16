//! Streaming ingestion: window the input, dedup each chunk, commit the file.

use crate::error::{EngineError, EngineResult};
use crate::{Engine, metrics};
use bytes::Bytes;
use depot_core::{
    Chunk, ChunkHash, Cid, ContentHash, ReceiptType, SignedReceipt, compute_merkle_root,
    validate_chunk_size,
};
use depot_metadata::models::NewFile;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use time::OffsetDateTime;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Per-call ingestion options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub uploader: Option<String>,
    /// Window size in bytes; the engine's configured default when `None`.
    pub chunk_size: Option<u64>,
    pub sign_receipt: bool,
    /// Checked between windows.
    pub cancel: Option<CancellationToken>,
}

/// Outcome of an ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub cid: Cid,
    pub total_size: u64,
    pub chunk_count: u64,
    pub merkle_root: ContentHash,
    pub chunk_hashes: Vec<ChunkHash>,
    /// Chunk references this call added to the store.
    pub new_chunks: u64,
    /// Chunk references satisfied by a chunk that was already stored.
    pub deduplicated_chunks: u64,
    /// `false` when a file with this CID already existed.
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SignedReceipt>,
}

/// Per-stream bookkeeping while windows are processed.
#[derive(Default)]
struct ChunkSequence {
    hashes: Vec<ChunkHash>,
    chunk_ids: Vec<i64>,
    // Hashes already resolved in this stream.
    seen: HashMap<ChunkHash, i64>,
    total_size: u64,
    new_chunks: u64,
    deduplicated_chunks: u64,
}

impl Engine {
    /// Ingest everything `reader` yields.
    #[instrument(skip_all, fields(filename = options.filename.as_deref()))]
    pub async fn ingest_stream<R>(
        &self,
        mut reader: R,
        options: IngestOptions,
    ) -> EngineResult<IngestSummary>
    where
        R: AsyncRead + Unpin + Send,
    {
        let chunk_size = options.chunk_size.unwrap_or(self.ingest.default_chunk_size);
        validate_chunk_size(chunk_size)?;

        let mut sequence = ChunkSequence::default();
        loop {
            check_cancelled(options.cancel.as_ref())?;

            let window = read_window(&mut reader, chunk_size).await?;
            if window.is_empty() {
                break;
            }
            sequence.total_size += window.len() as u64;
            self.ingest_chunk(&mut sequence, Chunk::new(Bytes::from(window)))
                .await?;
        }

        if sequence.hashes.is_empty() {
            self.ingest_chunk(&mut sequence, Chunk::empty()).await?;
        }

        check_cancelled(options.cancel.as_ref())?;

        let cid = Cid::compute(&sequence.hashes);
        let hex_hashes: Vec<String> = sequence.hashes.iter().map(ChunkHash::to_hex).collect();
        let merkle_root = compute_merkle_root(&hex_hashes);

        let new_file = NewFile {
            cid: cid.to_hex(),
            filename: options.filename,
            mime_type: options.mime_type,
            uploader: options.uploader,
            total_size: sequence.total_size as i64,
            chunk_count: sequence.hashes.len() as i64,
            merkle_root: merkle_root.to_hex(),
            created_at: OffsetDateTime::now_utc(),
        };
        let (file, created) = self
            .metadata
            .create_file_with_chunks(&new_file, &sequence.chunk_ids)
            .await?;

        metrics::BYTES_INGESTED.inc_by(sequence.total_size);
        if created {
            metrics::FILES_INGESTED.inc();
            tracing::info!(
                cid = %cid,
                total_size = sequence.total_size,
                chunk_count = sequence.hashes.len(),
                new_chunks = sequence.new_chunks,
                deduplicated_chunks = sequence.deduplicated_chunks,
                "file ingested"
            );
        } else {
            tracing::info!(cid = %cid, "file already present, keeping existing record");
        }

        let receipt = if options.sign_receipt {
            Some(self.issue_receipt(&file, ReceiptType::Ingest).await?)
        } else {
            None
        };

        Ok(IngestSummary {
            cid: Cid::from_hex(&file.cid)?,
            total_size: file.total_size as u64,
            chunk_count: file.chunk_count as u64,
            merkle_root: ContentHash::from_hex(&file.merkle_root)?,
            chunk_hashes: sequence.hashes,
            new_chunks: sequence.new_chunks,
            deduplicated_chunks: sequence.deduplicated_chunks,
            created,
            receipt,
        })
    }

    /// Ingest an in-memory buffer.
    pub async fn ingest_bytes(
        &self,
        data: &[u8],
        options: IngestOptions,
    ) -> EngineResult<IngestSummary> {
        self.ingest_stream(data, options).await
    }

    /// Ingest a local file. `filename` defaults to the path's file name.
    pub async fn ingest_path(
        &self,
        path: impl AsRef<Path>,
        mut options: IngestOptions,
    ) -> EngineResult<IngestSummary> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;

        if options.filename.is_none() {
            options.filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }

        self.ingest_stream(file, options).await
    }

    async fn ingest_chunk(&self, sequence: &mut ChunkSequence, chunk: Chunk) -> EngineResult<()> {
        let hash = chunk.hash;

        let known = match sequence.seen.get(&hash) {
            Some(id) => Some(*id),
            None => self.dedup.lookup(&hash).await?.map(|row| row.chunk_id),
        };

        let chunk_id = match known {
            Some(id) => {
                sequence.deduplicated_chunks += 1;
                metrics::CHUNKS_DEDUPLICATED.inc();
                id
            }
            None => {
                let size = chunk.size();
                // Bytes first, then the index entry: an index row always
                // points at a stored object.
                if self.storage.write_chunk(&hash, chunk.data).await? {
                    metrics::CHUNKS_WRITTEN.inc();
                }
                let (row, created) = self.dedup.record(&hash, size).await?;
                if created {
                    sequence.new_chunks += 1;
                } else {
                    sequence.deduplicated_chunks += 1;
                    metrics::CHUNKS_DEDUPLICATED.inc();
                }
                row.chunk_id
            }
        };

        sequence.seen.insert(hash, chunk_id);
        sequence.hashes.push(hash);
        sequence.chunk_ids.push(chunk_id);
        Ok(())
    }
}

/// Fill one window of up to `size` bytes; shorter only at end of stream.
async fn read_window<R>(reader: &mut R, size: u64) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    const INITIAL_CAPACITY: u64 = 1024 * 1024;
    let mut buf = Vec::with_capacity(size.min(INITIAL_CAPACITY) as usize);
    reader.take(size).read_to_end(&mut buf).await?;
    Ok(buf)
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> EngineResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => {
            tracing::warn!("ingestion cancelled");
            Err(EngineError::Cancelled)
        }
        _ => Ok(()),
    }
}
