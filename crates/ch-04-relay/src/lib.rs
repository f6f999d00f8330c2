//! # Relay (ch-04)
//!
//! Per-chain state machine moving cross-chain requests from a local ledger
//! to their destination hub and writing the outcome back.
//!
//! | Stage | Failure handling |
//! |-------|------------------|
//! | FETCH | cursor retries until the block exists |
//! | EXTRACT | malformed request logged, skipped |
//! | SKIP | seen transactions are not dispatched again |
//! | DISPATCH | transient errors retried, others drop the request |
//! | APPLY_CALLBACK | retried until the origin ledger accepts |
//! | PERSIST | retried until the block is stored |

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::RelayError;
pub use domain::stats::{RelayStats, RelayStatsSnapshot};
pub use ports::outbound::RequestDispatcher;
pub use service::RelayLoop;
