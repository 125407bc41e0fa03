// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session signers.
//!
//! The swap core never holds key material itself: it asks a [`SessionSigner`]
//! for signatures over decryption authorizations and compute requests. A
//! browser or hardware wallet implements the trait on the host side; for
//! local use a PEM-encoded secp256k1 key converts into alloy's
//! `PrivateKeySigner`, which implements it directly.

use std::path::Path;

use alloy::{
    primitives::{Address, Signature},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use k256::SecretKey;

use crate::error::{SwapError, SwapResult};

/// A wallet-held key that can authorize requests on behalf of its address.
#[async_trait]
pub trait SessionSigner: Send + Sync {
    /// Address that identifies this signer.
    fn address(&self) -> Address;

    /// Sign an arbitrary message (EIP-191 personal message).
    ///
    /// Implementations return [`SwapError::UserRejected`] when the holder
    /// declines the prompt.
    async fn sign_message(&self, message: &[u8]) -> SwapResult<Signature>;
}

#[async_trait]
impl SessionSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        alloy::signers::Signer::address(self)
    }

    async fn sign_message(&self, message: &[u8]) -> SwapResult<Signature> {
        alloy::signers::Signer::sign_message(self, message)
            .await
            .map_err(signer_failure)
    }
}

/// A failing signing backend is an infrastructure fault, not a missing
/// precondition.
fn signer_failure(error: alloy::signers::Error) -> SwapError {
    SwapError::network(format!("local signer failed: {error}"))
}

/// Errors raised while loading key material.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse a secp256k1 private key from PEM.
///
/// Accepts both SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
pub fn secret_key_from_pem(pem_bytes: &[u8]) -> Result<SecretKey, SigningError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid key format: {}", e)))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    let secret_key = secret_key_from_pem(pem_bytes)?;
    Ok(PrivateKeySigner::from_signing_key(secret_key.into()))
}

/// Load a PEM key file and build a signer from it.
pub fn load_signer(path: &Path) -> Result<PrivateKeySigner, SigningError> {
    let bytes = std::fs::read(path).map_err(|source| SigningError::Io {
        path: path.display().to_string(),
        source,
    })?;
    signer_from_pem(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::pkcs8::{EncodePrivateKey, LineEnding};

    const TEST_KEY: [u8; 32] = [0x11; 32];

    fn test_pem() -> String {
        let secret = SecretKey::from_slice(&TEST_KEY).unwrap();
        secret.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
    }

    #[test]
    fn test_secret_key_from_pkcs8_and_sec1() {
        let pkcs8 = secret_key_from_pem(test_pem().as_bytes()).unwrap();
        assert_eq!(pkcs8.to_bytes().as_slice(), &TEST_KEY);

        let sec1 = SecretKey::from_slice(&TEST_KEY)
            .unwrap()
            .to_sec1_pem(LineEnding::LF)
            .unwrap();
        let parsed = secret_key_from_pem(sec1.as_bytes()).unwrap();
        assert_eq!(parsed.to_bytes().as_slice(), &TEST_KEY);
    }

    #[test]
    fn test_signer_from_pem_matches_raw_key() {
        let from_pem = signer_from_pem(test_pem().as_bytes()).unwrap();
        let from_raw = PrivateKeySigner::from_slice(&TEST_KEY).unwrap();
        assert_eq!(
            SessionSigner::address(&from_pem),
            SessionSigner::address(&from_raw)
        );
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let result = signer_from_pem(b"not a pem");
        assert!(matches!(result, Err(SigningError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_load_signer_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.pem");
        std::fs::write(&path, test_pem()).unwrap();

        assert!(load_signer(&path).is_ok());
        assert!(matches!(
            load_signer(&dir.path().join("missing.pem")),
            Err(SigningError::Io { .. })
        ));
    }

    #[test]
    fn test_signer_failure_is_a_network_error() {
        let err = signer_failure(alloy::signers::Error::other("hsm unavailable"));
        assert_eq!(err.error_code(), "network_error");
    }

    #[tokio::test]
    async fn local_signer_signature_recovers_address() {
        let signer = PrivateKeySigner::from_slice(&TEST_KEY).unwrap();
        let signature = SessionSigner::sign_message(&signer, b"authorize").await.unwrap();
        let recovered = signature.recover_address_from_msg(b"authorize").unwrap();
        assert_eq!(recovered, SessionSigner::address(&signer));
    }
}
