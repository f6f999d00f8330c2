//! Relay counters, shared between a loop and whoever reports on it.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RelayStats {
    /// Blocks persisted.
    pub blocks_processed: AtomicU64,
    /// Requests dispatched and answered.
    pub requests_relayed: AtomicU64,
    /// Requests whose origin transaction was already relayed.
    pub duplicates_skipped: AtomicU64,
    /// Requests dropped after a non-transient dispatch error.
    pub dispatch_failures: AtomicU64,
    /// Envelopes that failed to decode.
    pub malformed_requests: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            blocks_processed: self.blocks_processed.load(Ordering::Relaxed),
            requests_relayed: self.requests_relayed.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            malformed_requests: self.malformed_requests.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub blocks_processed: u64,
    pub requests_relayed: u64,
    pub duplicates_skipped: u64,
    pub dispatch_failures: u64,
    pub malformed_requests: u64,
}
