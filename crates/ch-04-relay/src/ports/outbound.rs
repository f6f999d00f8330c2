//! # Outbound Ports
//!
//! The relay hands extracted requests to a dispatcher; in production that
//! is the hub client.

use async_trait::async_trait;
use ch_03_hub_protocol::{HubClient, HubError};
use shared_types::{CrossChainRequest, HubResponse};

#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    /// Deliver `request` to its destination and return the verified response.
    async fn dispatch(&self, request: &CrossChainRequest) -> Result<HubResponse, HubError>;
}

#[async_trait]
impl RequestDispatcher for HubClient {
    async fn dispatch(&self, request: &CrossChainRequest) -> Result<HubResponse, HubError> {
        HubClient::dispatch(self, request).await
    }
}
