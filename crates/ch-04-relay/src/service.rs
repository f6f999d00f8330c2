//! # Relay Loop
//!
//! One loop per local chain:
//!
//! ```text
//! FETCH ─→ EXTRACT ─→ SKIP (seen) ─────────────────────────────┐
//!                  └─→ DISPATCH ─→ record ─→ APPLY_CALLBACK ─→ PERSIST ─→ FETCH
//! ```
//!
//! Shutdown is observed while waiting for the next block only; a block that
//! has been fetched is always processed and persisted.

use crate::domain::errors::RelayError;
use crate::domain::stats::{RelayStats, RelayStatsSnapshot};
use crate::ports::outbound::RequestDispatcher;
use ch_01_block_store::{BlockStoreApi, StoredBlock};
use ch_02_ledger_cursor::{extract, LedgerCursor};
use ch_03_hub_protocol::HubError;
use shared_types::{
    ChainId, ChainRegistry, CrossChainMessage, CrossChainRequest, FixedBackoff, HubResponse,
    LocalChain, RawBlock, DEFAULT_BACKOFF, FN_CHAINCODE_INVOKE_RESULT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct RelayLoop {
    chain: ChainId,
    cursor: LedgerCursor,
    store: Arc<dyn BlockStoreApi>,
    dispatcher: Arc<dyn RequestDispatcher>,
    origin: LocalChain,
    backoff: FixedBackoff,
    stats: Arc<RelayStats>,
}

impl RelayLoop {
    /// Build the loop for `chain`, which must be hosted by this hub.
    pub fn new(
        chain: ChainId,
        registry: &ChainRegistry,
        store: Arc<dyn BlockStoreApi>,
        dispatcher: Arc<dyn RequestDispatcher>,
    ) -> Result<Self, RelayError> {
        let origin = registry.local(&chain)?.clone();
        let cursor = LedgerCursor::new(chain.clone(), Arc::clone(&origin.ledger), Arc::clone(&store));
        Ok(Self {
            chain,
            cursor,
            store,
            dispatcher,
            origin,
            backoff: FixedBackoff::forever(DEFAULT_BACKOFF),
            stats: Arc::new(RelayStats::new()),
        })
    }

    /// Override the retry interval of every stage.
    pub fn with_backoff(mut self, delay: Duration) -> Self {
        self.backoff = FixedBackoff::forever(delay);
        self.cursor = self.cursor.with_backoff(delay);
        self
    }

    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Relay until `shutdown` turns true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RelayStatsSnapshot {
        info!(chain = %self.chain, "[ch-04] Relay loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            let block = tokio::select! {
                block = self.cursor.fetch_next() => block,
                _ = shutdown.changed() => break,
            };
            self.process_block(block).await;
        }

        let stats = self.stats.snapshot();
        info!(
            chain = %self.chain,
            blocks = stats.blocks_processed,
            relayed = stats.requests_relayed,
            duplicates = stats.duplicates_skipped,
            "[ch-04] Relay loop stopped"
        );
        stats
    }

    /// Relay every request of `block`, then persist it.
    pub async fn process_block(&self, block: RawBlock) {
        for envelope in &block.envelopes {
            let request = match extract(envelope, &block) {
                Ok(Some(CrossChainMessage::Invoke(request))) => request,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        chain = %self.chain,
                        block = block.number,
                        tx_hash = ?envelope.tx_hash,
                        error = %err,
                        "[ch-04] Skipping malformed request"
                    );
                    RelayStats::incr(&self.stats.malformed_requests);
                    continue;
                }
            };
            self.relay(request).await;
        }
        self.persist(&block).await;
    }

    async fn relay(&self, request: CrossChainRequest) {
        let store = &self.store;
        let tx_hash = request.origin.tx_hash.as_str();
        let block = request.origin.block_number;

        if request.from != self.chain {
            let err = RelayError::ForeignOrigin {
                chain: self.chain.clone(),
                origin: request.from.clone(),
            };
            warn!(chain = %self.chain, block, tx_hash, error = %err, stage = "extract", "[ch-04] Skipping request");
            RelayStats::incr(&self.stats.malformed_requests);
            return;
        }

        let seen = self
            .backoff
            .run_until_ok(
                || async move { store.has_seen(tx_hash) },
                |attempt, err| {
                    warn!(chain = %self.chain, block, tx_hash, attempt, error = %err, stage = "skip", "[ch-04] Dedup lookup failed");
                },
            )
            .await;
        if seen {
            debug!(chain = %self.chain, block, tx_hash, "[ch-04] Request already relayed");
            RelayStats::incr(&self.stats.duplicates_skipped);
            return;
        }

        let response = match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => {
                error!(
                    chain = %self.chain,
                    block,
                    tx_hash,
                    to = %request.to,
                    tx_id = %request.transaction_id,
                    error = %err,
                    stage = "dispatch",
                    "[ch-04] Dropping request"
                );
                RelayStats::incr(&self.stats.dispatch_failures);
                return;
            }
        };

        let origin = &request.origin;
        self.backoff
            .run_until_ok(
                || async move {
                    store.record_seen(tx_hash, origin.block_number, &origin.block_hash, &origin.raw)
                },
                |attempt, err| {
                    warn!(chain = %self.chain, block, tx_hash, attempt, error = %err, stage = "record", "[ch-04] Dedup write failed");
                },
            )
            .await;

        self.apply_callback(&request, &response).await;
        RelayStats::incr(&self.stats.requests_relayed);

        info!(
            chain = %self.chain,
            block,
            tx_hash,
            to = %request.to,
            tx_id = %request.transaction_id,
            step = %request.step_id,
            error_message = %response.error_message,
            "[ch-04] Request relayed"
        );
    }

    async fn dispatch(&self, request: &CrossChainRequest) -> Result<HubResponse, RelayError> {
        let dispatcher = &self.dispatcher;
        let response = self
            .backoff
            .run(
                || dispatcher.dispatch(request),
                HubError::is_transient,
                |attempt, err| {
                    warn!(
                        chain = %self.chain,
                        tx_hash = %request.origin.tx_hash,
                        to = %request.to,
                        attempt,
                        error = %err,
                        stage = "dispatch",
                        "[ch-04] Dispatch failed, retrying"
                    );
                },
            )
            .await?;
        Ok(response)
    }

    /// Record the result on the origin router, then run the callback.
    async fn apply_callback(&self, request: &CrossChainRequest, response: &HubResponse) {
        let result_args = vec![
            request.from.as_str().as_bytes().to_vec(),
            request.to.as_str().as_bytes().to_vec(),
            request.transaction_id.as_bytes().to_vec(),
            request.step_id.as_bytes().to_vec(),
            response.payload.clone(),
            response.signer.clone(),
            response.error_message.as_bytes().to_vec(),
        ];
        self.invoke_until_ok(&self.origin.router_contract, FN_CHAINCODE_INVOKE_RESULT, result_args)
            .await;

        let descriptor = match response.callback_descriptor() {
            Ok(Some(descriptor)) if descriptor.is_actionable() => descriptor,
            Ok(_) => return,
            Err(err) => {
                let err = RelayError::MalformedCallback(err.to_string());
                warn!(chain = %self.chain, tx_id = %response.transaction_id, error = %err, "[ch-04] Ignoring callback");
                return;
            }
        };
        let args = descriptor
            .args
            .iter()
            .map(|arg| arg.as_bytes().to_vec())
            .collect();
        self.invoke_until_ok(&descriptor.chaincode, &descriptor.function, args)
            .await;
    }

    async fn invoke_until_ok(&self, contract: &str, function: &str, args: Vec<Vec<u8>>) {
        let args = &args;
        self.backoff
            .run_until_ok(
                || async move { self.invoke_origin(contract, function, args.clone()).await },
                |attempt, err| {
                    warn!(
                        chain = %self.chain,
                        contract,
                        function,
                        attempt,
                        error = %err,
                        stage = "callback",
                        "[ch-04] Origin invocation failed, retrying"
                    );
                },
            )
            .await;
    }

    async fn invoke_origin(
        &self,
        contract: &str,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<(), RelayError> {
        let response = self
            .origin
            .ledger
            .invoke(&self.chain, contract, function, args)
            .await?;
        if !response.is_ok() {
            return Err(RelayError::ContractRejected {
                contract: contract.to_string(),
                function: function.to_string(),
                message: response.message,
            });
        }
        Ok(())
    }

    async fn persist(&self, block: &RawBlock) {
        let store = &self.store;
        let stored = StoredBlock::from_raw(self.chain.clone(), block);
        let stored = &stored;
        self.backoff
            .run_until_ok(
                || async move { store.store_block(stored.clone()) },
                |attempt, err| {
                    warn!(chain = %self.chain, block = block.number, attempt, error = %err, stage = "persist", "[ch-04] Block write failed");
                },
            )
            .await;
        RelayStats::incr(&self.stats.blocks_processed);
        debug!(chain = %self.chain, block = block.number, "[ch-04] Block persisted");
    }
}
