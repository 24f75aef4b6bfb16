//! Core domain types and shared logic for the Depot chunk store.
//!
//! This crate defines the canonical data model used across all other crates:
//! - BLAKE3 content hashes and the textual concatenation hash
//! - Chunk hashes, CIDs and Merkle roots
//! - Receipt payloads and signatures
//! - Configuration

pub mod chunk;
pub mod cid;
pub mod config;
pub mod error;
pub mod file;
pub mod hash;
pub mod merkle;
pub mod receipt;

pub use chunk::{Chunk, ChunkHash, validate_chunk_size};
pub use cid::Cid;
pub use error::{Error, Result};
pub use file::FileMetadata;
pub use hash::{ContentHash, ContentHasher, hash_bytes, hash_concat};
pub use merkle::{compute_merkle_root, verify_merkle_root};
pub use receipt::{ReceiptPayload, ReceiptSignature, ReceiptType, SignedReceipt};

/// Default chunk size: 16 MiB
pub const DEFAULT_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum chunk size: 32 MiB
pub const MAX_CHUNK_SIZE: u64 = 32 * 1024 * 1024;

/// Minimum chunk size: 1 byte
pub const MIN_CHUNK_SIZE: u64 = 1;
