//! # Core Domain Entities
//!
//! Chain identifiers and the cross-chain entities that flow between the
//! relay subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `ChainId`, `TxHash`, `BlockHash`
//! - **Requests**: `CrossChainRequest`, `CrossChainMessage`, `TxOrigin`
//! - **Payloads**: `InvokePayload`, `CallbackDescriptor`, `ContractResponse`

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;

/// Hex-encoded ledger transaction id.
pub type TxHash = String;

/// Hex-encoded block header hash.
pub type BlockHash = String;

/// Well-known function name of the routing contract's register operation.
///
/// Transactions invoking this function are the cross-chain requests the
/// relay watches for.
pub const FN_CHAINCODE_INVOKE: &str = "ChainCodeInvoke";

/// Routing contract operation that records a result on the origin chain.
pub const FN_CHAINCODE_INVOKE_RESULT: &str = "ChainCodeInvokeResult";

/// Routing contract operation returning a previously recorded result.
pub const FN_QUERY_INVOKE_RESULT: &str = "QueryInvokeResult";

/// Proxy contract pass-through call, gated by the resource lock.
pub const FN_NO_TRANSACTION_CALL: &str = "NoTransactionCall";

/// Status code of a successful contract invocation.
pub const STATUS_OK: i32 = 200;

/// Status code of a failed contract invocation.
pub const STATUS_ERROR: i32 = 500;

/// Globally unique identifier of a participating ledger network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    /// Create a chain id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty ids are never valid registrations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ChainId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a request was found on the origin ledger.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TxOrigin {
    /// Originating transaction hash (the dedup key).
    pub tx_hash: TxHash,
    /// Number of the block holding the transaction.
    pub block_number: u64,
    /// Hash of the block holding the transaction.
    pub block_hash: BlockHash,
    /// Raw envelope bytes, kept for audit.
    #[serde_as(as = "Hex")]
    pub raw: Vec<u8>,
}

/// The decoded intent to invoke a contract method on a destination chain.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainRequest {
    /// Origin chain.
    pub from: ChainId,
    /// Destination chain.
    pub to: ChainId,
    /// Cross-chain transaction id.
    pub transaction_id: String,
    /// Sub-step within a multi-step flow.
    pub step_id: String,
    /// Opaque payload, a JSON `InvokePayload` in practice.
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    /// Signature over `payload`; empty until signed.
    #[serde_as(as = "Hex")]
    pub signer: Vec<u8>,
    /// Unix seconds; 0 until stamped.
    pub timestamp: i64,
    /// Ledger location of the originating transaction.
    pub origin: TxOrigin,
}

/// Every kind of cross-chain message the relay understands.
///
/// Extraction produces one of these and dispatch matches on it
/// exhaustively, so adding a kind is a compile error until both
/// boundaries handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossChainMessage {
    /// `ChainCodeInvoke` registered on the origin routing contract.
    Invoke(CrossChainRequest),
}

impl CrossChainMessage {
    /// Originating transaction of the message.
    pub fn origin(&self) -> &TxOrigin {
        match self {
            CrossChainMessage::Invoke(request) => &request.origin,
        }
    }

    /// Destination chain of the message.
    pub fn destination(&self) -> &ChainId {
        match self {
            CrossChainMessage::Invoke(request) => &request.to,
        }
    }
}

/// Contract call to run on the origin chain once the result arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CallbackDescriptor {
    /// Target contract name.
    pub chaincode: String,
    /// Function to invoke.
    #[serde(rename = "fn")]
    pub function: String,
    /// String arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CallbackDescriptor {
    /// Descriptors without a target contract are ignored.
    pub fn is_actionable(&self) -> bool {
        !self.chaincode.is_empty()
    }
}

/// Structured form of a request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InvokePayload {
    /// Destination channel; defaults to the destination chain id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Contract to invoke through the destination proxy.
    pub chaincode: String,
    /// Function on that contract.
    #[serde(rename = "fn")]
    pub function: String,
    /// String arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Optional callback to run on the origin chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<CallbackDescriptor>,
}

impl InvokePayload {
    /// Decode a JSON payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode as JSON.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Raw result of a contract invocation.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractResponse {
    /// 200 on success.
    pub status: i32,
    /// Contract or ledger message.
    #[serde(default)]
    pub message: String,
    /// Returned bytes.
    #[serde_as(as = "Hex")]
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl ContractResponse {
    /// Successful response carrying `payload`.
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload: payload.into(),
        }
    }

    /// Failed response carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    /// Whether the status is 200.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_payload_uses_short_keys() {
        let payload = InvokePayload {
            chaincode: "fabcar".into(),
            function: "QueryCar".into(),
            args: vec!["CAR1".into()],
            ..Default::default()
        };
        let json = String::from_utf8(payload.encode().unwrap()).unwrap();
        assert!(json.contains("\"fn\":\"QueryCar\""));
        assert!(!json.contains("callback"));
    }

    #[test]
    fn test_invoke_payload_decodes_callback() {
        let raw = br#"{"chaincode":"fabcar","fn":"QueryCar","args":["CAR1"],
            "callback":{"chaincode":"audit","fn":"Record","args":["x"]}}"#;
        let payload = InvokePayload::decode(raw).unwrap();
        let callback = payload.callback.unwrap();
        assert_eq!(callback.function, "Record");
        assert!(callback.is_actionable());
    }

    #[test]
    fn test_contract_response_hex_payload() {
        let response = ContractResponse::ok(b"ok".to_vec());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"payload\":\"6f6b\""));
        assert!(response.is_ok());
        assert!(!ContractResponse::error("boom").is_ok());
    }

    #[test]
    fn test_chain_id_display() {
        assert_eq!(ChainId::from("A").to_string(), "A");
        assert!(ChainId::default().is_empty());
    }
}
