//! Receipt signing for Depot.
//!
//! This crate provides:
//! - Ed25519 key parsing and encoding
//! - Receipt signing, with a no-op signer when no key is configured
//! - Receipt verification against trusted keys

pub mod error;
pub mod key;
pub mod signer;

pub use error::{SignerError, SignerResult};
pub use key::{KeyPair, PublicKey, SecretKey};
pub use signer::{
    Ed25519ReceiptSigner, ReceiptSigner, UnsignedReceiptSigner, verify_receipt, verify_signature,
};

use depot_core::config::{PrivateKeyConfig, SigningConfig};
use std::sync::Arc;

/// Load the key pair described by a signing configuration.
///
/// The configured `key_name` takes precedence over the name embedded in the
/// encoded key.
pub fn load_keypair(config: &SigningConfig) -> SignerResult<KeyPair> {
    let encoded = match &config.private_key {
        PrivateKeyConfig::File { path } => std::fs::read_to_string(path).map_err(|e| {
            SignerError::KeySource(format!("failed to read key file {}: {e}", path.display()))
        })?,
        PrivateKeyConfig::Env { var } => std::env::var(var).map_err(|e| {
            SignerError::KeySource(format!("failed to read environment variable {var}: {e}"))
        })?,
        PrivateKeyConfig::Value { key } => key.clone(),
    };

    let mut keypair = KeyPair::from_encoded_secret_key(&encoded)?;
    if keypair.name != config.key_name {
        tracing::debug!(
            embedded = %keypair.name,
            configured = %config.key_name,
            "using configured key name instead of the one embedded in the key"
        );
        keypair.name = config.key_name.clone();
    }
    Ok(keypair)
}

/// Create a receipt signer from optional configuration.
pub fn from_config(config: Option<&SigningConfig>) -> SignerResult<Arc<dyn ReceiptSigner>> {
    match config {
        Some(config) => {
            let signer = Ed25519ReceiptSigner::new(load_keypair(config)?);
            tracing::info!(key_name = %config.key_name, "receipt signing enabled");
            Ok(Arc::new(signer))
        }
        None => {
            tracing::warn!("No signing key configured - receipts will be unsigned");
            Ok(Arc::new(UnsignedReceiptSigner))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_key(name: &str) -> String {
        KeyPair::from_seed(name, &[5u8; 32]).to_encoded_secret_key()
    }

    #[test]
    fn test_load_keypair_from_value() {
        let config = SigningConfig {
            key_name: "depot-1".to_string(),
            private_key: PrivateKeyConfig::Value {
                key: encoded_key("depot-1"),
            },
        };
        let keypair = load_keypair(&config).unwrap();
        assert_eq!(keypair.name, "depot-1");
    }

    #[test]
    fn test_load_keypair_from_file_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.sec");
        std::fs::write(&path, format!("{}\n", encoded_key("embedded"))).unwrap();

        let config = SigningConfig {
            key_name: "configured".to_string(),
            private_key: PrivateKeyConfig::File { path },
        };
        let keypair = load_keypair(&config).unwrap();
        assert_eq!(keypair.name, "configured");
    }

    #[test]
    fn test_load_keypair_missing_env_var() {
        let config = SigningConfig {
            key_name: "depot-1".to_string(),
            private_key: PrivateKeyConfig::Env {
                var: "DEPOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            },
        };
        assert!(matches!(
            load_keypair(&config),
            Err(SignerError::KeySource(_))
        ));
    }

    #[test]
    fn test_from_config_without_key_is_unsigned() {
        let signer = from_config(None).unwrap();
        assert!(signer.key_name().is_none());
    }

    #[test]
    fn test_from_config_with_key_signs() {
        let config = SigningConfig {
            key_name: "depot-1".to_string(),
            private_key: PrivateKeyConfig::Value {
                key: encoded_key("depot-1"),
            },
        };
        let signer = from_config(Some(&config)).unwrap();
        assert_eq!(signer.key_name(), Some("depot-1"));
    }
}
