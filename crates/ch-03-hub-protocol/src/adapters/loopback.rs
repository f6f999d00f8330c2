//! # Loopback Transport
//!
//! In-process path to chains hosted by this hub.

use crate::domain::errors::HubError;
use crate::executor::HubExecutor;
use crate::ports::outbound::{HubConnection, HubConnector};
use async_trait::async_trait;
use shared_types::{ChainId, HubRequest, HubResponse};
use std::sync::Arc;

pub struct LoopbackConnector {
    executor: Arc<HubExecutor>,
}

impl LoopbackConnector {
    pub fn new(executor: Arc<HubExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl HubConnector for LoopbackConnector {
    async fn connect(&self, target: &ChainId) -> Result<Box<dyn HubConnection>, HubError> {
        if !self.executor.registry().is_local(target) {
            return Err(HubError::not_found(format!(
                "chain {target} is not hosted by this hub"
            )));
        }
        Ok(Box::new(LoopbackConnection {
            executor: Arc::clone(&self.executor),
        }))
    }
}

struct LoopbackConnection {
    executor: Arc<HubExecutor>,
}

#[async_trait]
impl HubConnection for LoopbackConnection {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        self.executor.execute(request).await
    }
}
