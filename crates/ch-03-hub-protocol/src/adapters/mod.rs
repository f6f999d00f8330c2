//! # Adapters
//!
//! - `http_server` - axum router serving the hub RPC
//! - `http_client` - reqwest transport to remote hubs
//! - `loopback` - in-process transport to chains hosted here
//! - `routing` - registry-driven choice between the two

pub mod http_client;
pub mod http_server;
pub mod loopback;
pub mod routing;

pub use http_client::{HttpConnection, HttpConnector};
pub use http_server::{hub_router, serve, HEALTH_PATH, INVOKE_PATH};
pub use loopback::LoopbackConnector;
pub use routing::RegistryConnector;
