//! Crypto error types.

use shared_types::ChainId;
use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Digest to sign or verify was empty
    #[error("Invalid digest: cannot be empty")]
    EmptyDigest,

    /// Signature to verify was empty
    #[error("Invalid signature: cannot be empty")]
    EmptySignature,

    /// Signature has the wrong length
    #[error("Invalid signature format: expected {expected} bytes, got {actual}")]
    InvalidSignatureFormat {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// Signature bytes are not a valid r||s encoding
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// No signing key registered for the chain
    #[error("No private key registered for chain {0}")]
    MissingPrivateKey(ChainId),

    /// No verification key registered for the chain
    #[error("No public key registered for chain {0}")]
    MissingPublicKey(ChainId),

    /// Chain registered twice in the trust store
    #[error("Chain {0} already has key material")]
    DuplicateChain(ChainId),

    /// Key material could not be read or decoded
    #[error("Key material error: {0}")]
    KeyMaterial(String),

    /// Signing failed inside the primitive
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
