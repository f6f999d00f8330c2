//! # Ledger Port
//!
//! The ledger client is an external collaborator: the relay only reads
//! blocks and invokes contracts through this trait. Both calls are opaque,
//! retryable I/O.

use crate::entities::{BlockHash, ChainId, ContractResponse, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use thiserror::Error;

/// One transaction envelope as decoded by the ledger client.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Envelope {
    /// Channel header transaction id; `None` when the header is absent.
    #[serde(default)]
    pub tx_hash: Option<TxHash>,
    /// Chaincode input arguments, function name first.
    #[serde_as(as = "Vec<Hex>")]
    #[serde(default)]
    pub args: Vec<Vec<u8>>,
    /// Raw envelope bytes.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub raw: Vec<u8>,
}

impl Envelope {
    /// Envelope invoking `args[0]` with the remaining args.
    pub fn invocation(tx_hash: impl Into<TxHash>, args: Vec<Vec<u8>>) -> Self {
        Self {
            tx_hash: Some(tx_hash.into()),
            args,
            raw: Vec::new(),
        }
    }

    /// Function name, if the envelope carries an invocation.
    pub fn function(&self) -> Option<&[u8]> {
        self.args.first().map(Vec::as_slice)
    }
}

/// A block as returned by the ledger client.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawBlock {
    pub number: u64,
    pub previous_hash: BlockHash,
    pub data_hash: String,
    pub hash: BlockHash,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub envelopes: Vec<Envelope>,
    /// Opaque block bytes for audit/replay.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub origin: Vec<u8>,
}

/// Ledger client failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The block has not been produced yet.
    #[error("Block {number} not found on chain {chain}")]
    NotFound { chain: ChainId, number: u64 },

    /// The chain is not served by this client.
    #[error("Unknown chain: {0}")]
    UnknownChain(ChainId),

    /// Transport or peer failure.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The contract invocation was rejected.
    #[error("Invocation failed: {0}")]
    InvocationFailed(String),

    /// The ledger returned data that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    /// Whether this is the "not produced yet" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

/// Ledger client - outbound port.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read block `number` of `chain`.
    async fn query_block(&self, chain: &ChainId, number: u64) -> Result<RawBlock, LedgerError>;

    /// Invoke `function` on `contract` with raw arguments.
    async fn invoke(
        &self,
        chain: &ChainId,
        contract: &str,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<ContractResponse, LedgerError>;
}
