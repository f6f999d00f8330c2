//! # HTTP Transport
//!
//! reqwest client for remote hubs. Each `connect` builds a fresh client,
//! so a re-dial after a deadline error starts from a new connection pool.

use crate::adapters::http_server::INVOKE_PATH;
use crate::domain::errors::{HubError, HubStatus};
use crate::ports::outbound::{HubConnection, HubConnector};
use async_trait::async_trait;
use shared_types::{ChainId, ChainRegistry, HubRequest, HubResponse};
use std::sync::Arc;
use std::time::Duration;

/// Dials the hub endpoint registered for a remote chain.
pub struct HttpConnector {
    registry: Arc<ChainRegistry>,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(registry: Arc<ChainRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Connection to an explicit hub endpoint.
    pub fn dial(&self, endpoint: &str) -> Result<HttpConnection, HubError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| HubError::internal(format!("build http client: {e}")))?;
        Ok(HttpConnection {
            client,
            url: format!("{}{}", endpoint.trim_end_matches('/'), INVOKE_PATH),
        })
    }
}

#[async_trait]
impl HubConnector for HttpConnector {
    async fn connect(&self, target: &ChainId) -> Result<Box<dyn HubConnection>, HubError> {
        let remote = self
            .registry
            .remote(target)
            .ok_or_else(|| HubError::not_found(format!("no hub endpoint for chain {target}")))?;
        Ok(Box::new(self.dial(&remote.endpoint)?))
    }
}

pub struct HttpConnection {
    client: reqwest::Client,
    url: String,
}

impl HttpConnection {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HubConnection for HttpConnection {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<HubResponse>()
                .await
                .map_err(|e| HubError::internal(format!("decode hub response: {e}")));
        }

        let body = response.text().await.map_err(transport_error)?;
        Err(serde_json::from_str::<HubError>(&body)
            .unwrap_or_else(|_| HubError::new(status_from_http(status.as_u16()), body)))
    }
}

fn transport_error(err: reqwest::Error) -> HubError {
    if err.is_timeout() {
        HubError::deadline_exceeded(err.to_string())
    } else {
        HubError::unavailable(err.to_string())
    }
}

fn status_from_http(code: u16) -> HubStatus {
    match code {
        400 | 422 => HubStatus::InvalidArgument,
        401 | 403 => HubStatus::Unauthenticated,
        404 => HubStatus::NotFound,
        502 | 503 => HubStatus::Unavailable,
        504 => HubStatus::DeadlineExceeded,
        _ => HubStatus::Internal,
    }
}
