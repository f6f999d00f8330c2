//! # Hub Client
//!
//! Issues the `invoke` RPC on behalf of a local origin chain.
//!
//! ## Flow
//!
//! 1. Sign the payload with the origin key when the signer is empty
//! 2. Stamp the current time when the timestamp is zero
//! 3. Dial the destination hub and call `invoke`; a `DeadlineExceeded`
//!    re-dials, up to [`MAX_DEADLINE_RETRIES`] times
//! 4. Check the response answers this request and verify its payload
//!    against the destination chain's key

use crate::domain::errors::HubError;
use crate::ports::outbound::HubConnector;
use shared_crypto::CryptoTrustStore;
use shared_types::{CrossChainRequest, FixedBackoff, HubRequest, HubResponse};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Re-dials allowed after a deadline error.
pub const MAX_DEADLINE_RETRIES: u32 = 5;

pub struct HubClient {
    csp: Arc<CryptoTrustStore>,
    connector: Arc<dyn HubConnector>,
    retry: FixedBackoff,
}

impl HubClient {
    pub fn new(csp: Arc<CryptoTrustStore>, connector: Arc<dyn HubConnector>) -> Self {
        Self {
            csp,
            connector,
            retry: FixedBackoff::limited(Duration::ZERO, MAX_DEADLINE_RETRIES),
        }
    }

    /// Dispatch an extracted request.
    pub async fn dispatch(&self, request: &CrossChainRequest) -> Result<HubResponse, HubError> {
        self.invoke(HubRequest::from(request)).await
    }

    /// Sign, send and verify one request.
    pub async fn invoke(&self, mut request: HubRequest) -> Result<HubResponse, HubError> {
        if request.signer.is_empty() {
            request.signer = self.csp.sign(&request.from, &request.payload)?;
        }
        if request.timestamp == 0 {
            request.timestamp = unix_now();
        }

        debug!(
            from = %request.from,
            to = %request.to,
            tx_id = %request.transaction_id,
            step = %request.step_id,
            "[ch-03] Sending invoke"
        );

        let connector = &self.connector;
        let response = self
            .retry
            .run(
                || {
                    let request = request.clone();
                    async move {
                        let connection = connector.connect(&request.to).await?;
                        connection.invoke(request).await
                    }
                },
                HubError::is_deadline_exceeded,
                |attempt, err| {
                    warn!(
                        to = %request.to,
                        tx_id = %request.transaction_id,
                        attempt,
                        error = %err,
                        "[ch-03] Invoke deadline exceeded, reconnecting"
                    );
                },
            )
            .await?;

        if response.to != request.to {
            return Err(HubError::unauthenticated(format!(
                "response signed for {} but request targeted {}",
                response.to, request.to
            )));
        }
        if response.from != request.from
            || response.transaction_id != request.transaction_id
            || response.step_id != request.step_id
        {
            return Err(HubError::unauthenticated(format!(
                "response for {}/{}/{} does not match request {}/{}/{}",
                response.from,
                response.transaction_id,
                response.step_id,
                request.from,
                request.transaction_id,
                request.step_id
            )));
        }
        self.verify(&response)?;
        Ok(response)
    }

    fn verify(&self, response: &HubResponse) -> Result<(), HubError> {
        match self
            .csp
            .verify(response.signer_chain(), &response.signer, &response.payload)
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(HubError::unauthenticated("signer invalid")),
            Err(err) => Err(HubError::unauthenticated(format!("signer invalid: {err}"))),
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
