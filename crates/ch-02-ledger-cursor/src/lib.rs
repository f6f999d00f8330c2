//! # Ledger Cursor (ch-02)
//!
//! Sequential block reading and cross-chain request extraction.
//!
//! ```text
//! LedgerClient ──query_block(n)──→ LedgerCursor ──RawBlock──→ extract() ──→ CrossChainMessage
//!                                       ↑
//!                        BlockStoreApi::latest_block_number (resume point)
//! ```
//!
//! ## Crate Structure
//!
//! - `domain/` - cursor, extractor, errors
//! - `adapters/` - in-memory ledger (tests, demos) and HTTP gateway client

pub mod adapters;
pub mod domain;

pub use adapters::{GatewayLedgerClient, InMemoryLedger, Invocation, RecordedResult};
pub use domain::cursor::LedgerCursor;
pub use domain::errors::ExtractError;
pub use domain::extractor::{extract, CHAINCODE_INVOKE_ARGS};
