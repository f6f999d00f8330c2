//! # Ports Layer
//!
//! - `inbound` - the hub RPC as served (`HubProtocolApi`)
//! - `outbound` - transports used to reach other hubs (`HubConnector`)

pub mod inbound;
pub mod outbound;
