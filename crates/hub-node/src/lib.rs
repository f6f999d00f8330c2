//! # Chain Hub Node
//!
//! Runtime of the cross-chain relay hub.
//!
//! ## Modular Structure
//!
//! - `config` - TOML configuration, validation, key loading
//! - `runtime` - registry wiring, hub RPC server, relay loop supervision
//!
//! ## Subsystems
//!
//! 1. Block Store (ch-01) - dedup records and consumed blocks
//! 2. Ledger Cursor (ch-02) - sequential block reads, request extraction
//! 3. Hub Protocol (ch-03) - signed `invoke` RPC between hubs
//! 4. Relay (ch-04) - per-chain relay state machine

pub mod config;
pub mod runtime;

pub use config::{ConfigError, HubConfig};
pub use runtime::{HubRuntime, SHUTDOWN_GRACE};
