//! Merkle root proofs recomputed from the stored chunk list.

use crate::error::{EngineError, EngineResult};
use crate::retrieve::check_links;
use crate::{Engine, metrics};
use depot_core::{Cid, ContentHash, ReceiptType, SignedReceipt, compute_merkle_root};
use serde::Serialize;
use tracing::instrument;

/// Result of recomputing a file's Merkle root.
///
/// A mismatch is reported through `matches`, not as an error.
#[derive(Debug, Clone, Serialize)]
pub struct ProofReport {
    pub cid: Cid,
    pub stored_root: ContentHash,
    pub computed_root: ContentHash,
    pub chunk_count: u64,
    pub matches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SignedReceipt>,
}

impl ProofReport {
    pub fn ensure_matches(&self) -> EngineResult<()> {
        if self.matches {
            return Ok(());
        }
        Err(EngineError::IntegrityMismatch {
            what: format!("merkle root of {}", self.cid),
            expected: self.stored_root.to_hex(),
            actual: self.computed_root.to_hex(),
        })
    }
}

impl Engine {
    /// Recompute the Merkle root of `cid` from its stored chunk hashes.
    ///
    /// Reads metadata only; chunk bytes are not fetched.
    #[instrument(skip(self), fields(cid = %cid))]
    pub async fn prove(&self, cid: &Cid, sign_receipt: bool) -> EngineResult<ProofReport> {
        let file = self.find_file(cid).await?;
        let stored_root = ContentHash::from_hex(&file.merkle_root)?;
        let links = self.metadata.get_file_chunks(file.file_id).await?;
        check_links(cid, file.chunk_count as u64, &links)?;

        let leaves: Vec<&str> = links.iter().map(|l| l.chunk_hash.as_str()).collect();
        let computed_root = compute_merkle_root(&leaves);
        let matches = computed_root == stored_root;

        if matches {
            tracing::debug!(root = %stored_root, "merkle root verified");
        } else {
            metrics::INTEGRITY_FAILURES.inc();
            tracing::warn!(
                stored = %stored_root,
                computed = %computed_root,
                "merkle root mismatch"
            );
        }

        let receipt = if sign_receipt {
            Some(self.issue_receipt(&file, ReceiptType::Retrieve).await?)
        } else {
            None
        };

        Ok(ProofReport {
            cid: *cid,
            stored_root,
            computed_root,
            chunk_count: links.len() as u64,
            matches,
            receipt,
        })
    }
}
