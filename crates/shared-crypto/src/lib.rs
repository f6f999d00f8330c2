//! # Shared Crypto - Chain Trust Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Standard chain signing |
//! | `sm2_dsa` | SM2 / SM3 | National-standard chain signing |
//! | `csp` | dispatch | Per-chain sign/verify |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization
//! - **SM2**: default distinguishing id `1234567812345678`
//! - Secret scalars are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod csp;
pub mod ecdsa;
pub mod errors;
pub mod sm2_dsa;

// Re-exports
pub use csp::{decode_key_material, ChainKey, CryptoTrustStore, CryptoTrustStoreBuilder, SignatureAlgorithm};
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use errors::CryptoError;
pub use sm2_dsa::{Sm2KeyPair, Sm2PublicKey, DEFAULT_DIST_ID};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
