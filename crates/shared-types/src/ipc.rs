//! # Hub Wire Messages
//!
//! Request and response of the single `invoke` RPC exchanged between hubs.
//! Byte fields travel hex-encoded.

use crate::entities::{CallbackDescriptor, ChainId, CrossChainRequest};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Request of the hub `invoke` RPC.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubRequest {
    pub from: ChainId,
    pub to: ChainId,
    pub transaction_id: String,
    pub step_id: String,
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    /// Signature of the origin chain over `payload`.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub signer: Vec<u8>,
    #[serde(default)]
    pub timestamp: i64,
}

impl From<&CrossChainRequest> for HubRequest {
    fn from(request: &CrossChainRequest) -> Self {
        Self {
            from: request.from.clone(),
            to: request.to.clone(),
            transaction_id: request.transaction_id.clone(),
            step_id: request.step_id.clone(),
            payload: request.payload.clone(),
            signer: request.signer.clone(),
            timestamp: request.timestamp,
        }
    }
}

/// Response of the hub `invoke` RPC.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubResponse {
    pub from: ChainId,
    pub to: ChainId,
    pub transaction_id: String,
    pub step_id: String,
    /// Marshalled `ContractResponse` of the destination ledger.
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    /// Signature of the destination chain over `payload`.
    #[serde_as(as = "Hex")]
    pub signer: Vec<u8>,
    /// Empty on success.
    #[serde(default)]
    pub error_message: String,
    /// JSON `CallbackDescriptor` copied from the request payload.
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub callback: Option<Vec<u8>>,
}

impl HubResponse {
    /// Chain whose key signed the payload.
    pub fn signer_chain(&self) -> &ChainId {
        &self.to
    }

    /// Whether the destination reported an application error.
    pub fn is_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    /// Decode the callback bytes, if any.
    pub fn callback_descriptor(&self) -> Result<Option<CallbackDescriptor>, serde_json::Error> {
        match &self.callback {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes).map(Some),
            _ => Ok(None),
        }
    }
}
