//! Ledger cursor.
//!
//! Reads one chain's blocks in strictly increasing, contiguous order. The
//! starting point comes from the block store: the block after the highest
//! stored one.

use ch_01_block_store::BlockStoreApi;
use shared_types::{ChainId, FixedBackoff, LedgerClient, LedgerError, RawBlock, DEFAULT_BACKOFF};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sequential block reader of one chain.
pub struct LedgerCursor {
    chain: ChainId,
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn BlockStoreApi>,
    /// Last block handed out; `None` until resolved from the store.
    position: Option<u64>,
    retry: FixedBackoff,
}

impl LedgerCursor {
    pub fn new(chain: ChainId, ledger: Arc<dyn LedgerClient>, store: Arc<dyn BlockStoreApi>) -> Self {
        Self {
            chain,
            ledger,
            store,
            position: None,
            retry: FixedBackoff::forever(DEFAULT_BACKOFF),
        }
    }

    /// Override the retry backoff.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.retry = FixedBackoff::forever(backoff);
        self
    }

    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// Number of the last block returned, once resolved.
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    /// Make the next fetch return block `number + 1`.
    pub fn reset_to(&mut self, number: u64) {
        debug!(chain = %self.chain, block = number, "[ch-02] Cursor reset");
        self.position = Some(number);
    }

    /// Next block, waiting for it to be produced.
    ///
    /// Never skips a block and never returns an error: "not found" and every
    /// other failure are retried after the backoff. Cancel safe: the cursor
    /// only advances when a block is returned.
    pub async fn fetch_next(&mut self) -> RawBlock {
        let number = self.resolve_position().await + 1;
        let this = &*self;
        let block = this
            .retry
            .run_until_ok(
                move || this.query(number),
                |attempt, err: &LedgerError| {
                    if err.is_not_found() {
                        debug!(chain = %this.chain, block = number, "[ch-02] Block not produced yet");
                    } else {
                        warn!(chain = %this.chain, block = number, attempt, error = %err, "[ch-02] Block query failed, retrying");
                    }
                },
            )
            .await;
        self.position = Some(number);
        debug!(chain = %self.chain, block = number, "[ch-02] Fetched block");
        block
    }

    async fn query(&self, number: u64) -> Result<RawBlock, LedgerError> {
        let block = self.ledger.query_block(&self.chain, number).await?;
        if block.number != number {
            return Err(LedgerError::Decode(format!(
                "requested block {number}, ledger returned {}",
                block.number
            )));
        }
        Ok(block)
    }

    async fn resolve_position(&mut self) -> u64 {
        if let Some(position) = self.position {
            return position;
        }
        let store = &self.store;
        let chain = &self.chain;
        let latest = self
            .retry
            .run_until_ok(
                move || async move { store.latest_block_number(chain) },
                |attempt, err| {
                    warn!(chain = %chain, attempt, error = %err, "[ch-02] Cannot read cursor checkpoint, retrying");
                },
            )
            .await;
        debug!(chain = %self.chain, block = latest, "[ch-02] Resuming after stored block");
        self.position = Some(latest);
        latest
    }
}
