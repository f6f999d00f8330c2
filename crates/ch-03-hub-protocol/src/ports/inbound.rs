//! # Inbound Ports

use crate::domain::errors::HubError;
use async_trait::async_trait;
use shared_types::{HubRequest, HubResponse};

/// The hub `invoke` RPC as served by a hub.
#[async_trait]
pub trait HubProtocolApi: Send + Sync {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError>;
}
