//! Building, signing and persisting receipts.

use crate::Engine;
use crate::error::{EngineError, EngineResult};
use depot_core::{Cid, ContentHash, ReceiptPayload, ReceiptType, SignedReceipt};
use depot_metadata::models::{FileRow, NewReceipt, ReceiptRow};

impl Engine {
    /// Sign a receipt describing `file` and append it to the receipt log.
    pub(crate) async fn issue_receipt(
        &self,
        file: &FileRow,
        receipt_type: ReceiptType,
    ) -> EngineResult<SignedReceipt> {
        let payload = ReceiptPayload::new(
            Cid::from_hex(&file.cid)?,
            file.total_size as u64,
            ContentHash::from_hex(&file.merkle_root)?,
            receipt_type,
        );
        let receipt = self.signer.sign(payload)?;

        self.metadata
            .create_receipt(&NewReceipt {
                file_id: file.file_id,
                receipt_type: receipt_type.as_str().to_string(),
                payload: receipt.payload.canonical_json()?,
                signature: receipt.signature.clone(),
                created_at: receipt.payload.created_at,
            })
            .await?;

        tracing::debug!(
            cid = %file.cid,
            receipt_type = %receipt_type,
            signed = receipt.is_signed(),
            "recorded receipt"
        );
        Ok(receipt)
    }

    /// All receipts recorded for `cid`, oldest first.
    pub async fn receipts(&self, cid: &Cid) -> EngineResult<Vec<SignedReceipt>> {
        let file = self.find_file(cid).await?;
        let rows = self.metadata.list_receipts(file.file_id).await?;
        rows.iter().map(receipt_from_row).collect()
    }
}

fn receipt_from_row(row: &ReceiptRow) -> EngineResult<SignedReceipt> {
    let payload = ReceiptPayload::from_json(&row.payload).map_err(|e| {
        EngineError::Serialization(format!("receipt {}: {e}", row.receipt_id))
    })?;
    Ok(SignedReceipt {
        payload,
        signature: row.signature.clone(),
    })
}
