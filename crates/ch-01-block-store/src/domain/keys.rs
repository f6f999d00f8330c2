//! Key layout.
//!
//! Every key is `{prefix}{chain_id}\0{suffix}`. Block numbers are big-endian
//! so a prefix scan returns blocks in number order.

use shared_types::ChainId;

/// Key namespaces of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// `b:{chain}\0{number}` -> StoredBlock
    Block,
    /// `h:{chain}\0{hash}` -> block number
    BlockByHash,
    /// `t:{chain}\0{tx_hash}` -> DedupRecord
    Transaction,
    /// `m:{chain}\0latest` -> highest stored block number
    Metadata,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Block => b"b:",
            KeyPrefix::BlockByHash => b"h:",
            KeyPrefix::Transaction => b"t:",
            KeyPrefix::Metadata => b"m:",
        }
    }

    /// Prefix of every key of this type for `chain`.
    pub fn chain_prefix(&self, chain: &ChainId) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(chain.as_str().as_bytes());
        key.push(0);
        key
    }

    /// Full key with the given suffix.
    pub fn key(&self, chain: &ChainId, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.chain_prefix(chain);
        key.extend_from_slice(suffix);
        key
    }

    pub fn block_key(chain: &ChainId, number: u64) -> Vec<u8> {
        KeyPrefix::Block.key(chain, &number.to_be_bytes())
    }

    pub fn hash_key(chain: &ChainId, hash: &str) -> Vec<u8> {
        KeyPrefix::BlockByHash.key(chain, hash.as_bytes())
    }

    pub fn transaction_key(chain: &ChainId, tx_hash: &str) -> Vec<u8> {
        KeyPrefix::Transaction.key(chain, tx_hash.as_bytes())
    }

    pub fn latest_key(chain: &ChainId) -> Vec<u8> {
        KeyPrefix::Metadata.key(chain, b"latest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_keys_sort_by_number() {
        let chain = ChainId::from("A");
        assert!(KeyPrefix::block_key(&chain, 2) < KeyPrefix::block_key(&chain, 256));
    }

    #[test]
    fn test_chain_prefix_is_not_shared() {
        let a = KeyPrefix::block_key(&"A".into(), 1);
        assert!(!a.starts_with(&KeyPrefix::Block.chain_prefix(&"AB".into())));
        assert!(a.starts_with(&KeyPrefix::Block.chain_prefix(&"A".into())));
    }
}
