//! # Hub Protocol (ch-03)
//!
//! The single `invoke` RPC exchanged between hubs.
//!
//! ```text
//! relay ──CrossChainRequest──→ HubClient ──sign──→ HubConnector ──→ remote HubService
//!                                 ↑                                      │
//!                                 └──────verify(to key)── HubResponse ←──┘
//! ```
//!
//! ## Crate Structure
//!
//! - `client` - signs, sends, re-dials on deadline, verifies
//! - `executor` - verify, proxy call, sign result for a local destination
//! - `service` - forward or execute
//! - `adapters/` - axum server, reqwest transport, loopback, routing
//! - `ports/` - `HubProtocolApi`, `HubConnector`, `HubConnection`

pub mod adapters;
pub mod client;
pub mod domain;
pub mod executor;
pub mod ports;
pub mod service;

pub use adapters::{
    hub_router, serve, HttpConnection, HttpConnector, LoopbackConnector, RegistryConnector,
};
pub use client::{HubClient, MAX_DEADLINE_RETRIES};
pub use domain::errors::{HubError, HubStatus};
pub use executor::HubExecutor;
pub use ports::inbound::HubProtocolApi;
pub use ports::outbound::{HubConnection, HubConnector, MockHubConnector};
pub use service::HubService;
