//! Ledger client adapters.

mod gateway;
mod memory_ledger;

pub use gateway::GatewayLedgerClient;
pub use memory_ledger::{ChaincodeHandler, InMemoryLedger, Invocation, RecordedResult};
