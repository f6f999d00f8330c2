//! # Registry Routing
//!
//! Picks the transport for a destination from its registration: local
//! chains go through the loopback connector, remote ones over HTTP.

use crate::adapters::http_client::HttpConnector;
use crate::domain::errors::HubError;
use crate::ports::outbound::{HubConnection, HubConnector};
use async_trait::async_trait;
use shared_types::{ChainId, ChainRegistry};
use std::sync::Arc;
use std::time::Duration;

pub struct RegistryConnector {
    registry: Arc<ChainRegistry>,
    loopback: Arc<dyn HubConnector>,
    http: HttpConnector,
}

impl RegistryConnector {
    pub fn new(
        registry: Arc<ChainRegistry>,
        loopback: Arc<dyn HubConnector>,
        request_timeout: Duration,
    ) -> Self {
        let http = HttpConnector::new(Arc::clone(&registry), request_timeout);
        Self {
            registry,
            loopback,
            http,
        }
    }
}

#[async_trait]
impl HubConnector for RegistryConnector {
    async fn connect(&self, target: &ChainId) -> Result<Box<dyn HubConnection>, HubError> {
        match self.registry.get(target) {
            Some(registration) if registration.is_local() => self.loopback.connect(target).await,
            Some(_) => self.http.connect(target).await,
            None => Err(HubError::not_found(format!("chain {target} is not registered"))),
        }
    }
}
