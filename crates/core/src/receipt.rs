//! Ingest and retrieval receipts.
//!
//! A receipt payload is serialized to JSON with a fixed field order; those
//! bytes are what a signer covers.

use crate::cid::Cid;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// The event a receipt attests to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptType {
    Ingest,
    Retrieve,
}

impl ReceiptType {
    /// String form used in payloads and the metadata store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Retrieve => "retrieve",
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ingest" => Some(Self::Ingest),
            "retrieve" => Some(Self::Retrieve),
            _ => None,
        }
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed portion of a receipt.
///
/// Field order is part of the wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptPayload {
    pub cid: Cid,
    pub total_size: u64,
    pub merkle_root: ContentHash,
    pub receipt_type: ReceiptType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ReceiptPayload {
    /// Build a payload stamped with the current UTC time.
    pub fn new(
        cid: Cid,
        total_size: u64,
        merkle_root: ContentHash,
        receipt_type: ReceiptType,
    ) -> Self {
        Self {
            cid,
            total_size,
            merkle_root,
            receipt_type,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Canonical JSON encoding.
    pub fn canonical_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Parse a payload from its JSON encoding.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Serialization(e.to_string()))
    }
}

/// A payload together with an optional signature string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedReceipt {
    pub payload: ReceiptPayload,
    /// `"<key_name>:<base64>"`, absent when signing is disabled.
    pub signature: Option<String>,
}

impl SignedReceipt {
    pub fn unsigned(payload: ReceiptPayload) -> Self {
        Self {
            payload,
            signature: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// A parsed receipt signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptSignature {
    /// Key name (e.g., "depot.example.com-1").
    pub key_name: String,
    /// Base64-encoded signature bytes.
    pub signature: String,
}

impl ReceiptSignature {
    /// Create a new signature.
    pub fn new(key_name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            signature: signature.into(),
        }
    }

    /// Parse from "keyname:signature" format.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let (key_name, signature) = s
            .split_once(':')
            .filter(|(name, sig)| !name.is_empty() && !sig.is_empty())
            .ok_or_else(|| {
                crate::Error::InvalidSignature(format!("invalid signature format: {s}"))
            })?;
        Ok(Self::new(key_name, signature))
    }
}

impl fmt::Display for ReceiptSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key_name, self.signature)
    }
}
