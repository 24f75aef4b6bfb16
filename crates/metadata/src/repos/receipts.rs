//! Receipt repository.

use crate::error::MetadataResult;
use crate::models::{NewReceipt, ReceiptRow};
use async_trait::async_trait;

/// Repository for receipt operations. Receipts are append-only.
#[async_trait]
pub trait ReceiptRepo: Send + Sync {
    /// Record a receipt.
    async fn create_receipt(&self, receipt: &NewReceipt) -> MetadataResult<ReceiptRow>;

    /// List receipts for a file, oldest first.
    async fn list_receipts(&self, file_id: i64) -> MetadataResult<Vec<ReceiptRow>>;
}
