//! # Inbound Ports (Driving Ports)
//!
//! API the relay loop and the runtime use to read and write relay state.

use crate::domain::entities::{DedupRecord, StoredBlock};
use crate::domain::errors::StoreError;
use shared_types::{ChainId, TxHash};

/// Dedup ledger and block store of one local chain.
pub trait BlockStoreApi: Send + Sync {
    /// Whether a request from `tx_hash` has already been relayed.
    fn has_seen(&self, tx_hash: &str) -> Result<bool, StoreError>;

    /// Record that `tx_hash` has been relayed.
    ///
    /// Returns `false` without writing when a record already exists.
    fn record_seen(
        &self,
        tx_hash: &str,
        block_number: u64,
        block_hash: &str,
        origin: &[u8],
    ) -> Result<bool, StoreError>;

    /// Persist a consumed block and patch its predecessor's forward link in
    /// the same atomic batch.
    fn store_block(&self, block: StoredBlock) -> Result<(), StoreError>;

    /// Highest stored block number of `chain`, 0 when none.
    fn latest_block_number(&self, chain: &ChainId) -> Result<u64, StoreError>;

    fn get_block_by_number(&self, chain: &ChainId, number: u64) -> Result<Option<StoredBlock>, StoreError>;

    fn get_block_by_hash(&self, chain: &ChainId, hash: &str) -> Result<Option<StoredBlock>, StoreError>;

    fn get_transaction(&self, tx_hash: &TxHash) -> Result<Option<DedupRecord>, StoreError>;
}
