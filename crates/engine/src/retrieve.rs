//! Reconstruction of files by CID.

use crate::error::{EngineError, EngineResult};
use crate::{Engine, file_metadata, metrics};
use bytes::{Bytes, BytesMut};
use depot_core::{
    Chunk, ChunkHash, Cid, FileMetadata, ReceiptType, SignedReceipt, verify_merkle_root,
};
use depot_metadata::models::FileChunkRow;
use tracing::instrument;

/// Per-call retrieval options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveOptions {
    pub sign_receipt: bool,
    /// Re-hash every fetched chunk. Falls back to the engine's configured
    /// `verify_chunks` when `None`.
    pub verify: Option<bool>,
}

/// A reconstructed file.
#[derive(Debug, Clone)]
pub struct RetrievedFile {
    pub metadata: FileMetadata,
    /// Chunk contents in file order.
    pub chunks: Vec<Bytes>,
    pub chunk_hashes: Vec<ChunkHash>,
    pub receipt: Option<SignedReceipt>,
}

impl RetrievedFile {
    /// Recompute the Merkle root from `chunk_hashes` and compare it with the
    /// stored root.
    pub fn verify(&self) -> EngineResult<()> {
        let leaves: Vec<String> = self.chunk_hashes.iter().map(ChunkHash::to_hex).collect();
        verify_merkle_root(&leaves, &self.metadata.merkle_root).map_err(|e| match e {
            depot_core::Error::HashMismatch { expected, actual } => EngineError::IntegrityMismatch {
                what: format!("merkle root of {}", self.metadata.cid),
                expected,
                actual,
            },
            other => other.into(),
        })
    }

    /// Total number of bytes across all chunks.
    pub fn len(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate the chunks into one buffer.
    pub fn into_bytes(self) -> Bytes {
        match self.chunks.len() {
            1 => self.chunks.into_iter().next().unwrap_or_default(),
            _ => {
                let mut out = BytesMut::with_capacity(self.len() as usize);
                for chunk in &self.chunks {
                    out.extend_from_slice(chunk);
                }
                out.freeze()
            }
        }
    }
}

impl Engine {
    /// Fetch the file stored under `cid`, chunk by chunk, in order.
    #[instrument(skip(self), fields(cid = %cid))]
    pub async fn retrieve_file(
        &self,
        cid: &Cid,
        options: RetrieveOptions,
    ) -> EngineResult<RetrievedFile> {
        let verify = options.verify.unwrap_or(self.retrieval.verify_chunks);

        let file = self.find_file(cid).await?;
        let metadata = file_metadata(&file)?;
        let links = self.metadata.get_file_chunks(file.file_id).await?;
        check_links(cid, metadata.chunk_count, &links)?;

        let mut chunks = Vec::with_capacity(links.len());
        let mut chunk_hashes = Vec::with_capacity(links.len());
        for link in &links {
            let hash = ChunkHash::from_hex(&link.chunk_hash)?;
            let data = self.storage.read_chunk(&hash).await?;

            if verify {
                verify_chunk(link, &hash, &data)?;
            }

            chunks.push(data);
            chunk_hashes.push(hash);
        }

        let receipt = if options.sign_receipt {
            Some(self.issue_receipt(&file, ReceiptType::Retrieve).await?)
        } else {
            None
        };

        metrics::FILES_RETRIEVED.inc();
        tracing::debug!(
            chunk_count = chunks.len(),
            total_size = metadata.total_size,
            verified = verify,
            "file retrieved"
        );

        Ok(RetrievedFile {
            metadata,
            chunks,
            chunk_hashes,
            receipt,
        })
    }
}

/// Links must cover positions `0..chunk_count` exactly once, in order.
pub(crate) fn check_links(cid: &Cid, chunk_count: u64, links: &[FileChunkRow]) -> EngineResult<()> {
    if links.len() as u64 != chunk_count {
        return Err(EngineError::IntegrityMismatch {
            what: format!("chunk links of {cid}"),
            expected: chunk_count.to_string(),
            actual: links.len().to_string(),
        });
    }
    for (expected, link) in links.iter().enumerate() {
        if link.position != expected as i64 {
            return Err(EngineError::IntegrityMismatch {
                what: format!("chunk position in {cid}"),
                expected: expected.to_string(),
                actual: link.position.to_string(),
            });
        }
    }
    Ok(())
}

fn verify_chunk(link: &FileChunkRow, expected: &ChunkHash, data: &Bytes) -> EngineResult<()> {
    let chunk = Chunk::new(data.clone());
    if let Err(depot_core::Error::HashMismatch { expected, actual }) = chunk.verify(expected) {
        metrics::INTEGRITY_FAILURES.inc();
        tracing::warn!(
            position = link.position,
            expected = %expected,
            actual = %actual,
            "stored chunk does not match its hash"
        );
        return Err(EngineError::IntegrityMismatch {
            what: format!("chunk at position {}", link.position),
            expected,
            actual,
        });
    }
    Ok(())
}
