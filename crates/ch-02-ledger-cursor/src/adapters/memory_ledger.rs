//! In-memory ledger.
//!
//! Serves blocks and emulates the routing and proxy contracts so a relay can
//! run end to end without a ledger network:
//!
//! - `ChainCodeInvoke` registers a request (rejecting a repeated
//!   txId+stepId) and commits it as a new block
//! - `ChainCodeInvokeResult` records a result for a registered request
//! - `QueryInvokeResult` returns a recorded result
//! - `NoTransactionCall` forwards to a registered chaincode unless the
//!   chaincode is locked by an unfinished transaction

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::{
    ChainId, ContractResponse, Envelope, LedgerClient, LedgerError, RawBlock, FN_CHAINCODE_INVOKE,
    FN_CHAINCODE_INVOKE_RESULT, FN_NO_TRANSACTION_CALL, FN_QUERY_INVOKE_RESULT,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Chaincode body: `(function, args) -> payload | error message`.
pub type ChaincodeHandler = Arc<dyn Fn(&str, &[String]) -> Result<Vec<u8>, String> + Send + Sync>;

/// One successful contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub contract: String,
    pub function: String,
    pub args: Vec<Vec<u8>>,
}

/// Result recorded by `ChainCodeInvokeResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedResult {
    pub from: String,
    pub to: String,
    pub transaction_id: String,
    pub step_id: String,
    pub payload: String,
    pub signer: String,
    pub message: String,
}

#[derive(Default)]
struct ChainState {
    router_contract: String,
    proxy_contract: String,
    blocks: Vec<RawBlock>,
    requests: HashMap<(String, String), Vec<Vec<u8>>>,
    results: HashMap<(String, String), RecordedResult>,
    locks: HashMap<String, String>,
    chaincodes: HashMap<String, ChaincodeHandler>,
    invocations: Vec<Invocation>,
    failing_queries: u32,
    failing_invokes: u32,
    tx_counter: u64,
}

/// Ledger client backed by process memory.
#[derive(Default)]
pub struct InMemoryLedger {
    chains: RwLock<HashMap<ChainId, ChainState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host `chain` with the given routing and proxy contract names.
    pub fn add_chain(&self, chain: impl Into<ChainId>, router_contract: &str, proxy_contract: &str) {
        self.chains.write().insert(
            chain.into(),
            ChainState {
                router_contract: router_contract.to_string(),
                proxy_contract: proxy_contract.to_string(),
                ..Default::default()
            },
        );
    }

    /// Deploy a chaincode reachable through the proxy and as a callback target.
    pub fn register_chaincode<F>(&self, chain: &ChainId, name: &str, handler: F) -> Result<(), LedgerError>
    where
        F: Fn(&str, &[String]) -> Result<Vec<u8>, String> + Send + Sync + 'static,
    {
        self.with_chain(chain, |state| {
            state.chaincodes.insert(name.to_string(), Arc::new(handler));
            Ok(())
        })
    }

    /// Lock `chaincode` on behalf of an unfinished transaction.
    pub fn lock_resource(&self, chain: &ChainId, chaincode: &str, transaction_id: &str) -> Result<(), LedgerError> {
        self.with_chain(chain, |state| {
            state.locks.insert(chaincode.to_string(), transaction_id.to_string());
            Ok(())
        })
    }

    pub fn unlock_resource(&self, chain: &ChainId, chaincode: &str) -> Result<(), LedgerError> {
        self.with_chain(chain, |state| {
            state.locks.remove(chaincode);
            Ok(())
        })
    }

    /// Commit a block holding `envelopes`.
    pub fn append_block(&self, chain: &ChainId, envelopes: Vec<Envelope>) -> Result<RawBlock, LedgerError> {
        self.with_chain(chain, |state| commit_block(state, envelopes))
    }

    /// Make the next `n` block queries fail as unavailable.
    pub fn fail_next_queries(&self, chain: &ChainId, n: u32) {
        if let Some(state) = self.chains.write().get_mut(chain) {
            state.failing_queries = n;
        }
    }

    /// Make the next `n` invocations fail as unavailable.
    pub fn fail_next_invokes(&self, chain: &ChainId, n: u32) {
        if let Some(state) = self.chains.write().get_mut(chain) {
            state.failing_invokes = n;
        }
    }

    /// Successful invocations on `chain`, oldest first.
    pub fn invocations(&self, chain: &ChainId) -> Vec<Invocation> {
        self.chains
            .read()
            .get(chain)
            .map(|state| state.invocations.clone())
            .unwrap_or_default()
    }

    /// Result recorded for `(transaction_id, step_id)`.
    pub fn recorded_result(&self, chain: &ChainId, transaction_id: &str, step_id: &str) -> Option<RecordedResult> {
        self.chains
            .read()
            .get(chain)
            .and_then(|state| state.results.get(&(transaction_id.to_string(), step_id.to_string())).cloned())
    }

    /// Number of committed blocks.
    pub fn height(&self, chain: &ChainId) -> u64 {
        self.chains
            .read()
            .get(chain)
            .map(|state| state.blocks.len() as u64)
            .unwrap_or(0)
    }

    fn with_chain<T>(
        &self,
        chain: &ChainId,
        f: impl FnOnce(&mut ChainState) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut chains = self.chains.write();
        let state = chains
            .get_mut(chain)
            .ok_or_else(|| LedgerError::UnknownChain(chain.clone()))?;
        f(state)
    }
}

fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

fn commit_block(state: &mut ChainState, envelopes: Vec<Envelope>) -> Result<RawBlock, LedgerError> {
    let number = state.blocks.len() as u64 + 1;
    let previous_hash = state.blocks.last().map(|b| b.hash.clone()).unwrap_or_default();
    let origin = serde_json::to_vec(&envelopes).map_err(|e| LedgerError::Decode(e.to_string()))?;
    let data_hash = sha256_hex(&[&origin]);
    let hash = sha256_hex(&[&number.to_be_bytes(), previous_hash.as_bytes(), data_hash.as_bytes()]);
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let block = RawBlock {
        number,
        previous_hash,
        data_hash,
        hash,
        timestamp,
        envelopes,
        origin,
    };
    state.blocks.push(block.clone());
    Ok(block)
}

fn utf8(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}

fn expect_args(function: &str, args: &[Vec<u8>], expected: usize) -> Result<(), LedgerError> {
    if args.len() != expected {
        return Err(LedgerError::InvocationFailed(format!(
            "{function}: incorrect number of arguments: {}",
            args.len()
        )));
    }
    Ok(())
}

fn router_call(state: &mut ChainState, function: &str, args: &[Vec<u8>]) -> Result<ContractResponse, LedgerError> {
    match function {
        FN_CHAINCODE_INVOKE => {
            expect_args(function, args, 6)?;
            let key = (utf8(&args[2]), utf8(&args[3]));
            if state.requests.contains_key(&key) {
                return Err(LedgerError::InvocationFailed(format!(
                    "transaction {}/{} is already registered",
                    key.0, key.1
                )));
            }
            state.requests.insert(key.clone(), args.to_vec());

            state.tx_counter += 1;
            let tx_hash = sha256_hex(&[
                state.router_contract.as_bytes(),
                &state.tx_counter.to_be_bytes(),
                key.0.as_bytes(),
                key.1.as_bytes(),
            ]);
            let mut envelope_args = vec![FN_CHAINCODE_INVOKE.as_bytes().to_vec()];
            envelope_args.extend_from_slice(args);
            let raw = serde_json::to_vec(&envelope_args).map_err(|e| LedgerError::Decode(e.to_string()))?;
            let envelope = Envelope {
                tx_hash: Some(tx_hash),
                args: envelope_args,
                raw,
            };
            commit_block(state, vec![envelope])?;
            Ok(ContractResponse::ok(key.0.into_bytes()))
        }
        FN_CHAINCODE_INVOKE_RESULT => {
            expect_args(function, args, 7)?;
            let key = (utf8(&args[2]), utf8(&args[3]));
            if !state.requests.contains_key(&key) {
                return Err(LedgerError::InvocationFailed(format!(
                    "transaction {}/{} is not found",
                    key.0, key.1
                )));
            }
            let result = RecordedResult {
                from: utf8(&args[0]),
                to: utf8(&args[1]),
                transaction_id: key.0.clone(),
                step_id: key.1.clone(),
                payload: utf8(&args[4]),
                signer: hex::encode(&args[5]),
                message: utf8(&args[6]),
            };
            state.results.insert(key, result);
            Ok(ContractResponse::ok(Vec::new()))
        }
        FN_QUERY_INVOKE_RESULT => {
            expect_args(function, args, 2)?;
            let key = (utf8(&args[0]), utf8(&args[1]));
            let payload = match state.results.get(&key) {
                Some(result) => serde_json::to_vec(result).map_err(|e| LedgerError::Decode(e.to_string()))?,
                None => Vec::new(),
            };
            Ok(ContractResponse::ok(payload))
        }
        other => Err(LedgerError::InvocationFailed(format!("Incorrect function: {other}"))),
    }
}

fn proxy_call(state: &ChainState, function: &str, args: &[Vec<u8>]) -> Result<ContractResponse, LedgerError> {
    if function != FN_NO_TRANSACTION_CALL {
        return Err(LedgerError::InvocationFailed(format!("Incorrect function: {function}")));
    }
    expect_args(function, args, 3)?;
    let chaincode = utf8(&args[0]);
    if let Some(holder) = state.locks.get(&chaincode) {
        return Err(LedgerError::InvocationFailed(format!(
            "resource is locked by unfinished transaction: {holder}"
        )));
    }
    let real_args: Vec<String> = serde_json::from_slice(&args[2])
        .map_err(|e| LedgerError::InvocationFailed(format!("failed to unmarshal json args: {e}")))?;
    let handler = state
        .chaincodes
        .get(&chaincode)
        .ok_or_else(|| LedgerError::InvocationFailed(format!("chaincode {chaincode} not found")))?;
    handler(&utf8(&args[1]), &real_args)
        .map(ContractResponse::ok)
        .map_err(LedgerError::InvocationFailed)
}

fn chaincode_call(state: &ChainState, contract: &str, function: &str, args: &[Vec<u8>]) -> Result<ContractResponse, LedgerError> {
    match state.chaincodes.get(contract) {
        Some(handler) => {
            let args: Vec<String> = args.iter().map(|a| utf8(a)).collect();
            handler(function, &args)
                .map(ContractResponse::ok)
                .map_err(LedgerError::InvocationFailed)
        }
        None => Ok(ContractResponse::ok(Vec::new())),
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn query_block(&self, chain: &ChainId, number: u64) -> Result<RawBlock, LedgerError> {
        self.with_chain(chain, |state| {
            if state.failing_queries > 0 {
                state.failing_queries -= 1;
                return Err(LedgerError::Unavailable("injected query failure".into()));
            }
            number
                .checked_sub(1)
                .and_then(|index| state.blocks.get(index as usize))
                .cloned()
                .ok_or_else(|| LedgerError::NotFound {
                    chain: chain.clone(),
                    number,
                })
        })
    }

    async fn invoke(
        &self,
        chain: &ChainId,
        contract: &str,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<ContractResponse, LedgerError> {
        self.with_chain(chain, |state| {
            if state.failing_invokes > 0 {
                state.failing_invokes -= 1;
                return Err(LedgerError::Unavailable("injected invoke failure".into()));
            }
            let response = if contract == state.router_contract {
                router_call(state, function, &args)?
            } else if contract == state.proxy_contract {
                proxy_call(state, function, &args)?
            } else {
                chaincode_call(state, contract, function, &args)?
            };
            state.invocations.push(Invocation {
                contract: contract.to_string(),
                function: function.to_string(),
                args,
            });
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.add_chain("A", "router", "proxy");
        ledger
            .register_chaincode(&"A".into(), "fabcar", |function, args| match function {
                "QueryCar" => Ok(format!("car:{}", args.join(",")).into_bytes()),
                other => Err(format!("unknown function {other}")),
            })
            .unwrap();
        ledger
    }

    fn register_args(tx: &str, step: &str) -> Vec<Vec<u8>> {
        vec![
            b"A".to_vec(),
            b"B".to_vec(),
            tx.as_bytes().to_vec(),
            step.as_bytes().to_vec(),
            b"{}".to_vec(),
            Vec::new(),
        ]
    }

    #[tokio::test]
    async fn test_register_request_commits_block() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        ledger.invoke(&chain, "router", FN_CHAINCODE_INVOKE, register_args("tx", "0")).await.unwrap();

        let block = ledger.query_block(&chain, 1).await.unwrap();
        assert_eq!(block.envelopes.len(), 1);
        assert_eq!(block.envelopes[0].args.len(), 7);
        assert_eq!(block.envelopes[0].function(), Some(FN_CHAINCODE_INVOKE.as_bytes()));
        assert!(ledger.query_block(&chain, 2).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_request_rejected() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        ledger.invoke(&chain, "router", FN_CHAINCODE_INVOKE, register_args("tx", "0")).await.unwrap();
        let err = ledger
            .invoke(&chain, "router", FN_CHAINCODE_INVOKE, register_args("tx", "0"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvocationFailed(_)));
        ledger.invoke(&chain, "router", FN_CHAINCODE_INVOKE, register_args("tx", "1")).await.unwrap();
        assert_eq!(ledger.height(&chain), 2);
    }

    #[tokio::test]
    async fn test_result_requires_known_request() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        let result_args = |tx: &str| {
            vec![
                b"A".to_vec(),
                b"B".to_vec(),
                tx.as_bytes().to_vec(),
                b"0".to_vec(),
                b"payload".to_vec(),
                vec![0xaa],
                Vec::new(),
            ]
        };
        assert!(ledger
            .invoke(&chain, "router", FN_CHAINCODE_INVOKE_RESULT, result_args("tx"))
            .await
            .is_err());

        ledger.invoke(&chain, "router", FN_CHAINCODE_INVOKE, register_args("tx", "0")).await.unwrap();
        ledger.invoke(&chain, "router", FN_CHAINCODE_INVOKE_RESULT, result_args("tx")).await.unwrap();

        let recorded = ledger.recorded_result(&chain, "tx", "0").unwrap();
        assert_eq!(recorded.payload, "payload");
        assert_eq!(recorded.signer, "aa");

        let query = ledger
            .invoke(&chain, "router", FN_QUERY_INVOKE_RESULT, vec![b"tx".to_vec(), b"0".to_vec()])
            .await
            .unwrap();
        assert!(!query.payload.is_empty());
    }

    #[tokio::test]
    async fn test_proxy_forwards_and_honours_lock() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        let args = vec![b"fabcar".to_vec(), b"QueryCar".to_vec(), br#"["CAR1"]"#.to_vec()];

        let response = ledger.invoke(&chain, "proxy", FN_NO_TRANSACTION_CALL, args.clone()).await.unwrap();
        assert_eq!(response.payload, b"car:CAR1".to_vec());

        ledger.lock_resource(&chain, "fabcar", "xa-1").unwrap();
        let err = ledger.invoke(&chain, "proxy", FN_NO_TRANSACTION_CALL, args.clone()).await.unwrap_err();
        assert!(err.to_string().contains("xa-1"));

        ledger.unlock_resource(&chain, "fabcar").unwrap();
        assert!(ledger.invoke(&chain, "proxy", FN_NO_TRANSACTION_CALL, args).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        ledger.append_block(&chain, vec![]).unwrap();
        ledger.fail_next_queries(&chain, 1);
        assert!(matches!(
            ledger.query_block(&chain, 1).await,
            Err(LedgerError::Unavailable(_))
        ));
        assert!(ledger.query_block(&chain, 1).await.is_ok());

        ledger.fail_next_invokes(&chain, 1);
        assert!(ledger.invoke(&chain, "audit", "Record", vec![]).await.is_err());
        assert!(ledger.invoke(&chain, "audit", "Record", vec![]).await.is_ok());
        assert_eq!(ledger.invocations(&chain).len(), 1);
    }

    #[tokio::test]
    async fn test_blocks_are_hash_linked() {
        let ledger = ledger();
        let chain = ChainId::from("A");
        let first = ledger.append_block(&chain, vec![]).unwrap();
        let second = ledger.append_block(&chain, vec![]).unwrap();
        assert_eq!(second.previous_hash, first.hash);
        assert_ne!(first.hash, second.hash);
    }

    #[tokio::test]
    async fn test_unknown_chain() {
        let ledger = ledger();
        assert!(matches!(
            ledger.query_block(&"Z".into(), 1).await,
            Err(LedgerError::UnknownChain(_))
        ));
    }
}
