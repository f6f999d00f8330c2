//! # Ports Layer
//!
//! - `inbound` - `BlockStoreApi`, driven by the relay loop
//! - `outbound` - `KeyValueStore`, implemented by storage adapters

pub mod inbound;
pub mod outbound;
