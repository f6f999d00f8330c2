//! # Block Store (ch-01)
//!
//! Persistent relay state of one local chain: the dedup ledger keyed by
//! transaction hash and the hash-linked store of consumed blocks.
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Single record | At most one dedup record per transaction hash |
//! | Forward link | Block N's `next_hash` is set when block N+1 is stored |
//! | Atomic writes | A block and its predecessor patch commit together |
//! | Resumable | `latest_block_number` is the highest stored block, 0 when empty |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - records, errors, key layout
//! - `ports/` - `BlockStoreApi` (inbound), `KeyValueStore` (outbound)
//! - `adapters/` - in-memory, file-backed and RocksDB backends
//! - `service.rs` - `BlockStoreService`
//!
//! ## Usage
//!
//! ```ignore
//! use ch_01_block_store::{BlockStoreService, InMemoryKVStore, BlockStoreApi};
//!
//! let store = BlockStoreService::new("A".into(), InMemoryKVStore::new());
//! if !store.has_seen(&tx_hash)? {
//!     store.record_seen(&tx_hash, number, &hash, &raw)?;
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::entities::{DedupRecord, StoredBlock};
pub use domain::errors::{KVStoreError, StoreError};
pub use domain::keys::KeyPrefix;
pub use ports::inbound::BlockStoreApi;
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::BlockStoreService;
