//! Repository traits for metadata operations.

pub mod chunks;
pub mod files;
pub mod receipts;

pub use chunks::{ChunkRepo, ChunkStats};
pub use files::FileRepo;
pub use receipts::ReceiptRepo;
