//! Engine error types.

use depot_metadata::MetadataError;
use depot_signer::SignerError;
use depot_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the ingestion, retrieval and proof pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("integrity mismatch for {what}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(#[source] StorageError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid chunk size: {size} (must be between {min} and {max})")]
    InvalidChunkSize { size: u64, min: u64, max: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("metadata error: {0}")]
    Metadata(#[source] MetadataError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::Io(_) | Self::Metadata(MetadataError::Database(_))
        )
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::NotFound(format!("chunk {key}")),
            StorageError::Config(msg) => Self::Configuration(msg),
            other => Self::BackendUnavailable(other),
        }
    }
}

impl From<MetadataError> for EngineError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Config(msg) => Self::Configuration(msg),
            other => Self::Metadata(other),
        }
    }
}

impl From<depot_core::Error> for EngineError {
    fn from(err: depot_core::Error) -> Self {
        use depot_core::Error;
        match err {
            Error::InvalidChunkSize { size, min, max } => Self::InvalidChunkSize { size, min, max },
            Error::HashMismatch { expected, actual } => Self::IntegrityMismatch {
                what: "hash".to_string(),
                expected,
                actual,
            },
            Error::InvalidHash(msg) | Error::InvalidSignature(msg) => Self::InvalidInput(msg),
            Error::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_taxonomy() {
        assert!(matches!(
            EngineError::from(StorageError::NotFound("ab".to_string())),
            EngineError::NotFound(_)
        ));
        assert!(matches!(
            EngineError::from(StorageError::Config("bucket".to_string())),
            EngineError::Configuration(_)
        ));

        let unavailable = EngineError::from(StorageError::Io(std::io::Error::other("down")));
        assert!(matches!(unavailable, EngineError::BackendUnavailable(_)));
        assert!(unavailable.is_retryable());
    }

    #[test]
    fn test_core_errors_map_to_taxonomy() {
        let err = EngineError::from(depot_core::Error::InvalidChunkSize {
            size: 0,
            min: 1,
            max: 2,
        });
        assert!(matches!(err, EngineError::InvalidChunkSize { size: 0, .. }));
        assert!(!err.is_retryable());

        let err = EngineError::from(depot_core::Error::InvalidHash("zz".to_string()));
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
