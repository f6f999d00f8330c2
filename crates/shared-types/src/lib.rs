//! # Shared Types Crate
//!
//! Domain entities, hub wire messages and the ports shared by every
//! chain-hub subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem types are defined here.
//! - **Ports, not adapters**: the ledger client is a trait; concrete clients
//!   live in the subsystems that own them.
//! - **Immutable wiring**: the chain registry is frozen before any relay
//!   loop starts.

pub mod entities;
pub mod ipc;
pub mod ledger;
pub mod registry;
pub mod retry;

pub use entities::*;
pub use ipc::*;
pub use ledger::*;
pub use registry::*;
pub use retry::{ConstantWithMaxRetryCount, FixedBackoff, DEFAULT_BACKOFF};
