//! # SM2 Signatures
//!
//! The national signature family of the trust store (SM2 over the SM2 curve
//! with the SM3 digest). Signing and verification always use the default
//! distinguishing identifier.

use crate::CryptoError;
use sm2::dsa::signature::{Signer, Verifier};
use sm2::dsa::{Signature, SigningKey, VerifyingKey};
use sm2::elliptic_curve::sec1::ToEncodedPoint;
use sm2::{PublicKey, SecretKey};
use zeroize::Zeroize;

/// Default SM2 distinguishing identifier.
pub const DEFAULT_DIST_ID: &str = "1234567812345678";

/// Length of an encoded signature.
pub const SIGNATURE_LEN: usize = 64;

/// SM2 public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sm2PublicKey {
    key: PublicKey,
}

impl Sm2PublicKey {
    /// Parse SEC1 bytes (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key = PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// Compressed SEC1 encoding.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.key.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Verify `signature` over `message`.
    ///
    /// Malformed encodings are errors; a well-formed signature that does not
    /// match yields `Ok(false)`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        if signature.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignatureFormat {
                expected: SIGNATURE_LEN,
                actual: signature.len(),
            });
        }
        let verifying_key = VerifyingKey::new(DEFAULT_DIST_ID, self.key)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = Signature::from_slice(signature)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

/// SM2 keypair.
pub struct Sm2KeyPair {
    secret: SecretKey,
    signing_key: SigningKey,
}

impl Sm2KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Result<Self, CryptoError> {
        let secret = SecretKey::random(&mut rand::thread_rng());
        Self::from_secret(secret)
    }

    /// Create from secret scalar bytes (32 bytes).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_secret(secret)
    }

    fn from_secret(secret: SecretKey) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::new(DEFAULT_DIST_ID, &secret).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self {
            secret,
            signing_key,
        })
    }

    /// Public half.
    pub fn public_key(&self) -> Sm2PublicKey {
        Sm2PublicKey {
            key: self.secret.public_key(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sig: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(sig.to_bytes().to_vec())
    }

    /// Secret scalar bytes (for provisioning).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.secret.to_bytes().to_vec()
    }
}

impl Drop for Sm2KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.secret.to_bytes().into();
        bytes.zeroize();
    }
}
