//! Ed25519 verification of incoming interaction requests.
//!
//! Discord signs `timestamp || body` with the application's key and sends
//! the hex signature in `X-Signature-Ed25519` and the timestamp in
//! `X-Signature-Timestamp`. Unsigned or mis-signed requests must be
//! answered with 401.

use ed25519_dalek::{Signature, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("public key is not valid hex: {0}")]
    InvalidKeyHex(String),

    #[error("public key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("public key is not a valid Ed25519 point")]
    InvalidKey,

    #[error("signature is malformed")]
    MalformedSignature,

    #[error("signature does not match")]
    Mismatch,
}

/// Verifies request signatures against the application's public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse the hex public key shown in the developer portal.
    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| SignatureError::InvalidKeyHex(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::InvalidKeyLength(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self::new(key))
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
        let raw = hex::decode(signature_hex.trim()).map_err(|_| SignatureError::MalformedSignature)?;
        let raw: [u8; 64] = raw
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::MalformedSignature)?;
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify_strict(&message, &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}
