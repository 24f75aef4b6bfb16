//! Ingestion, retrieval and proof pipelines for Depot.
//!
//! [`Engine`] owns one storage backend, one metadata store and one receipt
//! signer, and exposes:
//! - streaming ingestion with chunk-level deduplication
//! - ordered reconstruction of files by CID, optionally re-hashing chunks
//! - Merkle root proofs recomputed from the stored chunk list

pub mod dedup;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod proof;
mod receipts;
pub mod retrieve;

pub use dedup::DedupIndex;
pub use error::{EngineError, EngineResult};
pub use ingest::{IngestOptions, IngestSummary};
pub use proof::ProofReport;
pub use retrieve::{RetrieveOptions, RetrievedFile};

use depot_core::config::{AppConfig, IngestConfig, RetrievalConfig};
use depot_core::{Cid, ContentHash, FileMetadata};
use depot_metadata::models::FileRow;
use depot_metadata::{ChunkStats, MetadataStore};
use depot_signer::{ReceiptSigner, UnsignedReceiptSigner};
use depot_storage::ChunkStore;
use std::sync::Arc;

/// The Depot chunk storage engine.
#[derive(Clone)]
pub struct Engine {
    storage: Arc<dyn ChunkStore>,
    metadata: Arc<dyn MetadataStore>,
    signer: Arc<dyn ReceiptSigner>,
    dedup: DedupIndex,
    ingest: IngestConfig,
    retrieval: RetrievalConfig,
}

impl Engine {
    /// Create an engine from already-constructed collaborators, using default
    /// ingest and retrieval settings.
    pub fn new(
        storage: Arc<dyn ChunkStore>,
        metadata: Arc<dyn MetadataStore>,
        signer: Arc<dyn ReceiptSigner>,
    ) -> Self {
        metrics::init_metrics();
        Self {
            storage,
            dedup: DedupIndex::new(metadata.clone()),
            metadata,
            signer,
            ingest: IngestConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Create an engine with no receipt signing.
    pub fn unsigned(storage: Arc<dyn ChunkStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self::new(storage, metadata, Arc::new(UnsignedReceiptSigner))
    }

    pub fn with_ingest_config(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn with_retrieval_config(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Validate `config` and build every collaborator it describes.
    pub async fn from_config(config: &AppConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::Configuration)?;

        let storage = depot_storage::from_config(&config.storage).await?;
        let metadata = depot_metadata::from_config(&config.metadata).await?;
        let signer = depot_signer::from_config(config.signing.as_ref())
            .map_err(|e| EngineError::Configuration(format!("signing key: {e}")))?;

        tracing::info!(
            backend = storage.backend_name(),
            signing = signer.key_name().is_some(),
            default_chunk_size = config.ingest.default_chunk_size,
            "engine initialized"
        );

        Ok(Self::new(storage, metadata, signer)
            .with_ingest_config(config.ingest.clone())
            .with_retrieval_config(config.retrieval.clone()))
    }

    pub fn storage(&self) -> &Arc<dyn ChunkStore> {
        &self.storage
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn signer(&self) -> &Arc<dyn ReceiptSigner> {
        &self.signer
    }

    pub fn dedup(&self) -> &DedupIndex {
        &self.dedup
    }

    /// Chunk and file counts, including the deduplication ratio inputs.
    pub async fn stats(&self) -> EngineResult<ChunkStats> {
        Ok(self.metadata.get_stats().await?)
    }

    /// Check both the storage backend and the metadata store.
    pub async fn health_check(&self) -> EngineResult<()> {
        self.storage.health_check().await?;
        self.metadata.health_check().await?;
        Ok(())
    }

    pub(crate) async fn find_file(&self, cid: &Cid) -> EngineResult<FileRow> {
        self.metadata
            .get_file_by_cid(&cid.to_hex())
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("file {cid}")))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.storage.backend_name())
            .field("signing_key", &self.signer.key_name())
            .field("ingest", &self.ingest)
            .field("retrieval", &self.retrieval)
            .finish_non_exhaustive()
    }
}

pub(crate) fn file_metadata(row: &FileRow) -> EngineResult<FileMetadata> {
    Ok(FileMetadata {
        cid: Cid::from_hex(&row.cid)?,
        filename: row.filename.clone(),
        mime_type: row.mime_type.clone(),
        uploader: row.uploader.clone(),
        total_size: row.total_size as u64,
        chunk_count: row.chunk_count as u64,
        merkle_root: ContentHash::from_hex(&row.merkle_root)?,
        created_at: row.created_at,
    })
}
