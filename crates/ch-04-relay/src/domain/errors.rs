//! # Relay Errors

use ch_01_block_store::StoreError;
use ch_02_ledger_cursor::ExtractError;
use ch_03_hub_protocol::HubError;
use shared_types::{ChainId, LedgerError, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] HubError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// The origin router or callback contract answered with a non-200 status.
    #[error("Contract {contract}.{function} rejected call: {message}")]
    ContractRejected {
        contract: String,
        function: String,
        message: String,
    },

    #[error("Malformed callback descriptor: {0}")]
    MalformedCallback(String),

    /// A request on `chain` claims another chain as its origin.
    #[error("Request on {chain} claims origin {origin}")]
    ForeignOrigin { chain: ChainId, origin: ChainId },
}

impl RelayError {
    /// Whether the failed step is retried after the backoff.
    ///
    /// Transport and storage failures are transient; authentication,
    /// structural and configuration errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RelayError::Dispatch(err) => err.is_transient(),
            RelayError::Ledger(_) | RelayError::Store(_) | RelayError::ContractRejected { .. } => {
                true
            }
            RelayError::Registry(_)
            | RelayError::Extract(_)
            | RelayError::MalformedCallback(_)
            | RelayError::ForeignOrigin { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RelayError::from(HubError::deadline_exceeded("slow")).is_transient());
        assert!(RelayError::from(HubError::unavailable("down")).is_transient());
        assert!(!RelayError::from(HubError::unauthenticated("signer invalid")).is_transient());
        assert!(!RelayError::from(HubError::invalid_argument("bad")).is_transient());
        assert!(RelayError::from(LedgerError::Unavailable("peer".into())).is_transient());
        assert!(!RelayError::from(ExtractError::EmptyField { field: "from" }).is_transient());
        assert!(!RelayError::MalformedCallback("x".into()).is_transient());
        assert!(!RelayError::ForeignOrigin {
            chain: "A".into(),
            origin: "Z".into()
        }
        .is_transient());
        assert!(!RelayError::from(HubError::not_found("no private key")).is_transient());
    }
}
