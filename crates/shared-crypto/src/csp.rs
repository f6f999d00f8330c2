//! # Crypto Trust Store
//!
//! Per-chain key holder. Each chain maps to key material of exactly one
//! signature family, chosen at registration; `sign` and `verify` dispatch on
//! the concrete key type.
//!
//! Local chains register a private key (the public half is derived), remote
//! chains register only a public key. The store is frozen after
//! construction and shared through `Arc`.

use crate::ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
use crate::sm2_dsa::{Sm2KeyPair, Sm2PublicKey};
use crate::CryptoError;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Signature family of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    /// secp256k1 ECDSA.
    Ecdsa,
    /// SM2 with the default distinguishing id.
    Sm2,
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureAlgorithm::Ecdsa => f.write_str("ecdsa"),
            SignatureAlgorithm::Sm2 => f.write_str("sm2"),
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecdsa" => Ok(SignatureAlgorithm::Ecdsa),
            "sm2" => Ok(SignatureAlgorithm::Sm2),
            other => Err(CryptoError::KeyMaterial(format!(
                "unknown signature algorithm: {other}"
            ))),
        }
    }
}

/// Key material of one chain.
pub enum ChainKey {
    /// ECDSA private key (local chains).
    EcdsaPrivate(Secp256k1KeyPair),
    /// ECDSA public key (remote chains).
    EcdsaPublic(Secp256k1PublicKey),
    /// SM2 private key (local chains).
    Sm2Private(Sm2KeyPair),
    /// SM2 public key (remote chains).
    Sm2Public(Sm2PublicKey),
}

impl ChainKey {
    /// Parse a private key of `algorithm` from raw scalar bytes.
    pub fn private(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        match algorithm {
            SignatureAlgorithm::Ecdsa => Ok(ChainKey::EcdsaPrivate(Secp256k1KeyPair::from_slice(bytes)?)),
            SignatureAlgorithm::Sm2 => Ok(ChainKey::Sm2Private(Sm2KeyPair::from_slice(bytes)?)),
        }
    }

    /// Parse a public key of `algorithm` from SEC1 bytes.
    pub fn public(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        match algorithm {
            SignatureAlgorithm::Ecdsa => Ok(ChainKey::EcdsaPublic(Secp256k1PublicKey::from_sec1_bytes(bytes)?)),
            SignatureAlgorithm::Sm2 => Ok(ChainKey::Sm2Public(Sm2PublicKey::from_sec1_bytes(bytes)?)),
        }
    }

    /// Fresh random private key.
    pub fn generate(algorithm: SignatureAlgorithm) -> Result<Self, CryptoError> {
        match algorithm {
            SignatureAlgorithm::Ecdsa => Ok(ChainKey::EcdsaPrivate(Secp256k1KeyPair::generate())),
            SignatureAlgorithm::Sm2 => Ok(ChainKey::Sm2Private(Sm2KeyPair::generate()?)),
        }
    }

    /// Signature family of this key.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            ChainKey::EcdsaPrivate(_) | ChainKey::EcdsaPublic(_) => SignatureAlgorithm::Ecdsa,
            ChainKey::Sm2Private(_) | ChainKey::Sm2Public(_) => SignatureAlgorithm::Sm2,
        }
    }

    /// Whether this key can sign.
    pub fn is_private(&self) -> bool {
        matches!(self, ChainKey::EcdsaPrivate(_) | ChainKey::Sm2Private(_))
    }

    /// Public-only copy, as a remote hub would register it.
    pub fn to_public(&self) -> ChainKey {
        match self {
            ChainKey::EcdsaPrivate(kp) => ChainKey::EcdsaPublic(kp.public_key()),
            ChainKey::EcdsaPublic(pk) => ChainKey::EcdsaPublic(pk.clone()),
            ChainKey::Sm2Private(kp) => ChainKey::Sm2Public(kp.public_key()),
            ChainKey::Sm2Public(pk) => ChainKey::Sm2Public(pk.clone()),
        }
    }

    /// Compressed SEC1 public key bytes.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            ChainKey::EcdsaPrivate(kp) => kp.public_key().to_sec1_bytes(),
            ChainKey::EcdsaPublic(pk) => pk.to_sec1_bytes(),
            ChainKey::Sm2Private(kp) => kp.public_key().to_sec1_bytes(),
            ChainKey::Sm2Public(pk) => pk.to_sec1_bytes(),
        }
    }

    fn sign(&self, chain: &ChainId, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            ChainKey::EcdsaPrivate(kp) => Ok(kp.sign(digest)),
            ChainKey::Sm2Private(kp) => kp.sign(digest),
            ChainKey::EcdsaPublic(_) | ChainKey::Sm2Public(_) => {
                Err(CryptoError::MissingPrivateKey(chain.clone()))
            }
        }
    }

    fn verify(&self, signature: &[u8], digest: &[u8]) -> Result<bool, CryptoError> {
        match self {
            ChainKey::EcdsaPrivate(kp) => kp.public_key().verify(digest, signature),
            ChainKey::EcdsaPublic(pk) => pk.verify(digest, signature),
            ChainKey::Sm2Private(kp) => kp.public_key().verify(digest, signature),
            ChainKey::Sm2Public(pk) => pk.verify(digest, signature),
        }
    }
}

impl fmt::Debug for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainKey")
            .field("algorithm", &self.algorithm())
            .field("private", &self.is_private())
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish()
    }
}

/// Immutable per-chain key store.
#[derive(Debug, Default, Clone)]
pub struct CryptoTrustStore {
    keys: HashMap<ChainId, Arc<ChainKey>>,
}

impl CryptoTrustStore {
    /// Start building a store.
    pub fn builder() -> CryptoTrustStoreBuilder {
        CryptoTrustStoreBuilder::default()
    }

    /// Sign `digest` with `chain`'s private key.
    pub fn sign(&self, chain: &ChainId, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if digest.is_empty() {
            return Err(CryptoError::EmptyDigest);
        }
        let key = self
            .keys
            .get(chain)
            .ok_or_else(|| CryptoError::MissingPrivateKey(chain.clone()))?;
        key.sign(chain, digest)
    }

    /// Verify `signature` over `digest` with `chain`'s public key.
    ///
    /// `Ok(false)` on mismatch; errors on empty input, malformed encoding or
    /// a missing key.
    pub fn verify(&self, chain: &ChainId, signature: &[u8], digest: &[u8]) -> Result<bool, CryptoError> {
        if signature.is_empty() {
            return Err(CryptoError::EmptySignature);
        }
        if digest.is_empty() {
            return Err(CryptoError::EmptyDigest);
        }
        let key = self
            .keys
            .get(chain)
            .ok_or_else(|| CryptoError::MissingPublicKey(chain.clone()))?;
        key.verify(signature, digest)
    }

    /// Whether `chain` has a signing key.
    pub fn can_sign(&self, chain: &ChainId) -> bool {
        self.keys.get(chain).is_some_and(|key| key.is_private())
    }

    /// Key registered for `chain`.
    pub fn key(&self, chain: &ChainId) -> Option<&ChainKey> {
        self.keys.get(chain).map(Arc::as_ref)
    }
}

/// Builder rejecting duplicate chains.
#[derive(Debug, Default)]
pub struct CryptoTrustStoreBuilder {
    keys: HashMap<ChainId, Arc<ChainKey>>,
}

impl CryptoTrustStoreBuilder {
    /// Register one key for every chain in `chains`.
    ///
    /// A namespace hosting several channels shares one key across them.
    pub fn insert<I>(&mut self, chains: I, key: ChainKey) -> Result<&mut Self, CryptoError>
    where
        I: IntoIterator<Item = ChainId>,
    {
        let key = Arc::new(key);
        for chain in chains {
            if self.keys.contains_key(&chain) {
                return Err(CryptoError::DuplicateChain(chain));
            }
            self.keys.insert(chain, Arc::clone(&key));
        }
        Ok(self)
    }

    /// Freeze the store.
    pub fn build(self) -> CryptoTrustStore {
        CryptoTrustStore { keys: self.keys }
    }
}

/// Decode key material given either as inline hex or as a path to a file
/// holding hex.
pub fn decode_key_material(value: &str) -> Result<Vec<u8>, CryptoError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CryptoError::KeyMaterial("empty key material".into()));
    }
    if let Ok(bytes) = decode_hex(value) {
        return Ok(bytes);
    }
    let path = Path::new(value);
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CryptoError::KeyMaterial(format!("{}: {e}", path.display())))?;
    decode_hex(contents.trim())
        .map_err(|e| CryptoError::KeyMaterial(format!("{}: {e}", path.display())))
}

fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value))
}
