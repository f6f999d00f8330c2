//! # Hub Service
//!
//! Entry point of the hub RPC. Requests originating from a chain hosted
//! here are forwarded through the client; everything else is executed
//! against the local destination.

use crate::client::HubClient;
use crate::domain::errors::HubError;
use crate::executor::HubExecutor;
use crate::ports::inbound::HubProtocolApi;
use async_trait::async_trait;
use shared_types::{HubRequest, HubResponse};
use std::sync::Arc;
use tracing::debug;

pub struct HubService {
    executor: Arc<HubExecutor>,
    client: Arc<HubClient>,
}

impl HubService {
    pub fn new(executor: Arc<HubExecutor>, client: Arc<HubClient>) -> Self {
        Self { executor, client }
    }

    pub fn client(&self) -> &Arc<HubClient> {
        &self.client
    }
}

#[async_trait]
impl HubProtocolApi for HubService {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        if request.from == request.to {
            return Err(HubError::invalid_argument(format!(
                "from and to are both {}",
                request.from
            )));
        }

        if self.executor.registry().is_local(&request.from) {
            debug!(from = %request.from, to = %request.to, tx_id = %request.transaction_id, "[ch-03] Forwarding local request");
            return self.client.invoke(request).await;
        }

        self.executor.execute(request).await
    }
}
