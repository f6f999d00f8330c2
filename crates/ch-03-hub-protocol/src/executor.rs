//! # Hub Executor
//!
//! Executes an inbound request against a chain hosted by this hub:
//! verify the origin signature, call the destination proxy contract,
//! sign the marshalled contract response with the destination key.
//!
//! Ledger failures travel back as a signed status-500 payload with the
//! error message set; only protocol violations become `HubError`s.

use crate::domain::errors::HubError;
use crate::ports::inbound::HubProtocolApi;
use async_trait::async_trait;
use shared_crypto::CryptoTrustStore;
use shared_types::{
    ChainId, ChainRegistry, ContractResponse, HubRequest, HubResponse, InvokePayload,
    FN_NO_TRANSACTION_CALL,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct HubExecutor {
    registry: Arc<ChainRegistry>,
    csp: Arc<CryptoTrustStore>,
}

impl HubExecutor {
    pub fn new(registry: Arc<ChainRegistry>, csp: Arc<CryptoTrustStore>) -> Self {
        Self { registry, csp }
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    pub async fn execute(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        if request.from == request.to {
            return Err(HubError::invalid_argument(format!(
                "from and to are both {}",
                request.from
            )));
        }
        if !self.registry.is_local(&request.to) {
            return Err(HubError::not_found(format!(
                "chain {} is not hosted by this hub",
                request.to
            )));
        }

        match self.csp.verify(&request.from, &request.signer, &request.payload) {
            Ok(true) => {}
            Ok(false) => return Err(HubError::unauthenticated("signer invalid")),
            Err(err) => {
                return Err(HubError::unauthenticated(format!("signer invalid: {err}")))
            }
        }

        let payload = InvokePayload::decode(&request.payload)
            .map_err(|e| HubError::invalid_argument(format!("malformed payload: {e}")))?;

        let target = payload
            .channel
            .as_deref()
            .filter(|channel| !channel.is_empty())
            .map(ChainId::from)
            .unwrap_or_else(|| request.to.clone());

        let (contract_response, error_message) = self.call_proxy(&target, &payload).await?;

        let result = serde_json::to_vec(&contract_response)
            .map_err(|e| HubError::internal(format!("marshal contract response: {e}")))?;
        let signer = self
            .csp
            .sign(&request.to, &result)
            .map_err(HubError::from)?;
        let callback = payload
            .callback
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HubError::internal(format!("marshal callback: {e}")))?;

        info!(
            from = %request.from,
            to = %request.to,
            tx_id = %request.transaction_id,
            step = %request.step_id,
            status = contract_response.status,
            "[ch-03] Executed cross-chain request"
        );

        Ok(HubResponse {
            from: request.from,
            to: request.to,
            transaction_id: request.transaction_id,
            step_id: request.step_id,
            payload: result,
            signer,
            error_message,
            callback,
        })
    }

    async fn call_proxy(
        &self,
        target: &ChainId,
        payload: &InvokePayload,
    ) -> Result<(ContractResponse, String), HubError> {
        let local = self
            .registry
            .local(target)
            .map_err(|e| HubError::not_found(e.to_string()))?;

        let args_json = serde_json::to_vec(&payload.args)
            .map_err(|e| HubError::internal(format!("marshal args: {e}")))?;
        let args = vec![
            payload.chaincode.clone().into_bytes(),
            payload.function.clone().into_bytes(),
            args_json,
        ];

        match local
            .ledger
            .invoke(target, &local.proxy_contract, FN_NO_TRANSACTION_CALL, args)
            .await
        {
            Ok(response) if response.is_ok() => Ok((response, String::new())),
            Ok(response) => {
                let message = if response.message.is_empty() {
                    format!("contract returned status {}", response.status)
                } else {
                    response.message
                };
                warn!(chain = %target, chaincode = %payload.chaincode, error = %message, "[ch-03] Proxy call rejected");
                Ok((ContractResponse::error(message.clone()), message))
            }
            Err(err) => {
                let message = err.to_string();
                warn!(chain = %target, chaincode = %payload.chaincode, error = %message, "[ch-03] Proxy call failed");
                Ok((ContractResponse::error(message.clone()), message))
            }
        }
    }
}

#[async_trait]
impl HubProtocolApi for HubExecutor {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        self.execute(request).await
    }
}
