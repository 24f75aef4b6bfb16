//! Receipt signing and verification.

use crate::error::{SignerError, SignerResult};
use crate::key::{KeyPair, PublicKey};
use base64::Engine;
use depot_core::{ReceiptPayload, ReceiptSignature, SignedReceipt};
use ed25519_dalek::Signer as _;
use ed25519_dalek::Verifier;

/// Something that turns receipt payloads into (optionally) signed receipts.
pub trait ReceiptSigner: Send + Sync {
    /// Sign a payload.
    fn sign(&self, payload: ReceiptPayload) -> SignerResult<SignedReceipt>;

    /// The key name, or `None` when receipts are left unsigned.
    fn key_name(&self) -> Option<&str>;
}

/// Signs the canonical JSON of receipt payloads with an Ed25519 key.
pub struct Ed25519ReceiptSigner {
    keypair: KeyPair,
}

impl Ed25519ReceiptSigner {
    /// Create a new signer from a key pair.
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Create from an encoded secret key string.
    pub fn from_encoded_secret_key(s: &str) -> SignerResult<Self> {
        Ok(Self::new(KeyPair::from_encoded_secret_key(s)?))
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    /// Get the encoded public key string.
    pub fn encoded_public_key(&self) -> String {
        self.keypair.to_encoded_public_key()
    }

    /// Sign arbitrary bytes and return the signature.
    pub fn sign_bytes(&self, message: &[u8]) -> ReceiptSignature {
        let sig = self.keypair.secret.signing_key().sign(message);
        let sig_b64 = base64::engine::general_purpose::STANDARD.encode(sig.to_bytes());
        ReceiptSignature::new(&self.keypair.name, sig_b64)
    }
}

impl ReceiptSigner for Ed25519ReceiptSigner {
    fn sign(&self, payload: ReceiptPayload) -> SignerResult<SignedReceipt> {
        let message = payload
            .canonical_json()
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        let signature = self.sign_bytes(message.as_bytes());
        Ok(SignedReceipt {
            payload,
            signature: Some(signature.to_string()),
        })
    }

    fn key_name(&self) -> Option<&str> {
        Some(&self.keypair.name)
    }
}

/// Leaves receipts unsigned. Used when no signing key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsignedReceiptSigner;

impl ReceiptSigner for UnsignedReceiptSigner {
    fn sign(&self, payload: ReceiptPayload) -> SignerResult<SignedReceipt> {
        Ok(SignedReceipt::unsigned(payload))
    }

    fn key_name(&self) -> Option<&str> {
        None
    }
}

/// Verify a signature over raw message bytes.
pub fn verify_signature(
    message: &[u8],
    signature: &ReceiptSignature,
    public_key: &PublicKey,
) -> SignerResult<()> {
    let sig_bytes = base64::engine::general_purpose::STANDARD
        .decode(&signature.signature)
        .map_err(|e| SignerError::InvalidSignature(format!("invalid base64: {e}")))?;

    let sig_array: [u8; 64] = sig_bytes.try_into().map_err(|b: Vec<u8>| {
        SignerError::InvalidSignature(format!("expected 64 bytes, got {}", b.len()))
    })?;

    let signature = ed25519_dalek::Signature::from_bytes(&sig_array);

    public_key
        .verifying_key()
        .verify(message, &signature)
        .map_err(|_| SignerError::VerificationFailed)?;

    Ok(())
}

/// Verify a receipt against a list of trusted, named public keys.
///
/// Returns `Ok(false)` for unsigned receipts and for signatures whose key is
/// not trusted. A trusted key with a bad signature is an error.
pub fn verify_receipt(
    receipt: &SignedReceipt,
    trusted_keys: &[(String, PublicKey)],
) -> SignerResult<bool> {
    let Some(raw) = receipt.signature.as_deref() else {
        return Ok(false);
    };
    let signature =
        ReceiptSignature::parse(raw).map_err(|e| SignerError::InvalidSignature(e.to_string()))?;

    let Some((_, public_key)) = trusted_keys
        .iter()
        .find(|(name, _)| name == &signature.key_name)
    else {
        return Ok(false);
    };

    let message = receipt
        .payload
        .canonical_json()
        .map_err(|e| SignerError::Signing(e.to_string()))?;
    verify_signature(message.as_bytes(), &signature, public_key)?;
    Ok(true)
}
