//! # Block Store Service
//!
//! Dedup ledger and block store of one local chain over any
//! `KeyValueStore` backend.
//!
//! Mutations hold the backend lock across their read-modify-write, so
//! `record_seen` never creates two records for one hash and `store_block`
//! never loses a forward-link patch.

use crate::domain::entities::{DedupRecord, StoredBlock};
use crate::domain::errors::StoreError;
use crate::domain::keys::KeyPrefix;
use crate::ports::inbound::BlockStoreApi;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::Mutex;
use shared_types::{ChainId, TxHash};
use tracing::{debug, warn};

/// The Block Store Service.
pub struct BlockStoreService<KV: KeyValueStore> {
    /// Chain whose dedup records this store holds.
    chain: ChainId,
    kv_store: Mutex<KV>,
}

impl<KV: KeyValueStore> BlockStoreService<KV> {
    /// Create a store for `chain` over `kv_store`.
    pub fn new(chain: ChainId, kv_store: KV) -> Self {
        Self {
            chain,
            kv_store: Mutex::new(kv_store),
        }
    }

    /// Chain this store belongs to.
    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    fn read_block(kv: &KV, chain: &ChainId, number: u64) -> Result<Option<StoredBlock>, StoreError> {
        match kv.get(&KeyPrefix::block_key(chain, number))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn number_by_hash(kv: &KV, chain: &ChainId, hash: &str) -> Result<Option<u64>, StoreError> {
        match kv.get(&KeyPrefix::hash_key(chain, hash))? {
            Some(bytes) => Ok(Some(decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }

    fn latest(kv: &KV, chain: &ChainId) -> Result<u64, StoreError> {
        match kv.get(&KeyPrefix::latest_key(chain))? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

impl<KV: KeyValueStore> BlockStoreApi for BlockStoreService<KV> {
    fn has_seen(&self, tx_hash: &str) -> Result<bool, StoreError> {
        let kv = self.kv_store.lock();
        Ok(kv.exists(&KeyPrefix::transaction_key(&self.chain, tx_hash))?)
    }

    fn record_seen(
        &self,
        tx_hash: &str,
        block_number: u64,
        block_hash: &str,
        origin: &[u8],
    ) -> Result<bool, StoreError> {
        let key = KeyPrefix::transaction_key(&self.chain, tx_hash);
        let mut kv = self.kv_store.lock();
        if kv.exists(&key)? {
            debug!(chain = %self.chain, tx_hash, "[ch-01] Dedup record already present");
            return Ok(false);
        }
        let record = DedupRecord {
            tx_hash: tx_hash.to_string(),
            block_number,
            block_hash: block_hash.to_string(),
            origin: origin.to_vec(),
        };
        kv.put(&key, &bincode::serialize(&record)?)?;
        debug!(chain = %self.chain, tx_hash, block = block_number, "[ch-01] Recorded dedup entry");
        Ok(true)
    }

    fn store_block(&self, mut block: StoredBlock) -> Result<(), StoreError> {
        let chain = block.chain_id.clone();
        let mut kv = self.kv_store.lock();

        // A replayed block keeps the link patched by its successor.
        if let Some(existing) = Self::read_block(&kv, &chain, block.number)? {
            if existing.hash == block.hash && block.next_hash.is_none() {
                block.next_hash = existing.next_hash;
            }
        }

        let mut batch = Vec::with_capacity(4);

        if !block.previous_hash.is_empty() {
            if let Some(prev_number) = Self::number_by_hash(&kv, &chain, &block.previous_hash)? {
                let mut prev = Self::read_block(&kv, &chain, prev_number)?.ok_or_else(|| {
                    StoreError::DanglingIndex {
                        hash: block.previous_hash.clone(),
                    }
                })?;
                if prev.next_hash.is_none() {
                    prev.next_hash = Some(block.hash.clone());
                    batch.push(BatchOperation::put(
                        KeyPrefix::block_key(&chain, prev.number),
                        bincode::serialize(&prev)?,
                    ));
                } else if prev.next_hash.as_deref() != Some(block.hash.as_str()) {
                    warn!(
                        chain = %chain,
                        block = prev.number,
                        "[ch-01] Predecessor already linked to a different successor"
                    );
                }
            }
        }

        batch.push(BatchOperation::put(
            KeyPrefix::hash_key(&chain, &block.hash),
            block.number.to_be_bytes().to_vec(),
        ));
        if block.number >= Self::latest(&kv, &chain)? {
            batch.push(BatchOperation::put(
                KeyPrefix::latest_key(&chain),
                block.number.to_be_bytes().to_vec(),
            ));
        }
        batch.push(BatchOperation::put(
            KeyPrefix::block_key(&chain, block.number),
            bincode::serialize(&block)?,
        ));

        kv.atomic_batch_write(batch)?;
        debug!(chain = %chain, block = block.number, "[ch-01] Stored block");
        Ok(())
    }

    fn latest_block_number(&self, chain: &ChainId) -> Result<u64, StoreError> {
        let kv = self.kv_store.lock();
        Self::latest(&kv, chain)
    }

    fn get_block_by_number(&self, chain: &ChainId, number: u64) -> Result<Option<StoredBlock>, StoreError> {
        let kv = self.kv_store.lock();
        Self::read_block(&kv, chain, number)
    }

    fn get_block_by_hash(&self, chain: &ChainId, hash: &str) -> Result<Option<StoredBlock>, StoreError> {
        let kv = self.kv_store.lock();
        match Self::number_by_hash(&kv, chain, hash)? {
            Some(number) => Self::read_block(&kv, chain, number),
            None => Ok(None),
        }
    }

    fn get_transaction(&self, tx_hash: &TxHash) -> Result<Option<DedupRecord>, StoreError> {
        let kv = self.kv_store.lock();
        match kv.get(&KeyPrefix::transaction_key(&self.chain, tx_hash))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}
