//! Persisted records: consumed blocks and dedup markers.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_types::{BlockHash, ChainId, RawBlock, TxHash};

/// A block already consumed by a relay loop.
///
/// Immutable once written except for `next_hash`, which is patched exactly
/// once when the successor is stored.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub chain_id: ChainId,
    pub number: u64,
    pub previous_hash: BlockHash,
    pub hash: BlockHash,
    pub data_hash: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub tx_count: usize,
    /// Opaque block bytes.
    #[serde_as(as = "Hex")]
    pub origin: Vec<u8>,
    /// Hash of the successor block, once stored.
    pub next_hash: Option<BlockHash>,
}

impl StoredBlock {
    /// Build the persisted form of a block read from `chain`.
    pub fn from_raw(chain_id: ChainId, raw: &RawBlock) -> Self {
        Self {
            chain_id,
            number: raw.number,
            previous_hash: raw.previous_hash.clone(),
            hash: raw.hash.clone(),
            data_hash: raw.data_hash.clone(),
            timestamp: raw.timestamp,
            tx_count: raw.envelopes.len(),
            origin: raw.origin.clone(),
            next_hash: None,
        }
    }
}

/// Marker meaning "this transaction has been relayed; never again".
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRecord {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub block_hash: BlockHash,
    /// Raw originating envelope.
    #[serde_as(as = "Hex")]
    pub origin: Vec<u8>,
}
