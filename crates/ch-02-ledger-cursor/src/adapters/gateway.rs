//! HTTP ledger-gateway client.
//!
//! - `GET  {base}/channels/{chain}/blocks/{number}` -> `RawBlock` JSON, 404 when not produced
//! - `POST {base}/channels/{chain}/invoke` with `InvokeBody` -> `ContractResponse` JSON

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use shared_types::{ChainId, ContractResponse, LedgerClient, LedgerError, RawBlock};
use std::time::Duration;

/// Body of an invoke call; byte arguments travel hex-encoded.
#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    contract: &'a str,
    function: &'a str,
    args: Vec<String>,
}

/// `LedgerClient` over a ledger gateway's REST API.
#[derive(Debug, Clone)]
pub struct GatewayLedgerClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayLedgerClient {
    /// Client for the gateway at `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn transport(err: reqwest::Error) -> LedgerError {
    LedgerError::Unavailable(err.to_string())
}

#[async_trait]
impl LedgerClient for GatewayLedgerClient {
    async fn query_block(&self, chain: &ChainId, number: u64) -> Result<RawBlock, LedgerError> {
        let url = format!("{}/channels/{}/blocks/{}", self.base_url, chain, number);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(LedgerError::NotFound {
                chain: chain.clone(),
                number,
            }),
            status if status.is_success() => response
                .json::<RawBlock>()
                .await
                .map_err(|e| LedgerError::Decode(e.to_string())),
            status => Err(LedgerError::Unavailable(format!("{url}: HTTP {status}"))),
        }
    }

    async fn invoke(
        &self,
        chain: &ChainId,
        contract: &str,
        function: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<ContractResponse, LedgerError> {
        let url = format!("{}/channels/{}/invoke", self.base_url, chain);
        let body = InvokeBody {
            contract,
            function,
            args: args.iter().map(hex::encode).collect(),
        };
        let response = self.http.post(&url).json(&body).send().await.map_err(transport)?;
        let status = response.status();
        if status.is_server_error() {
            return Err(LedgerError::Unavailable(format!("{url}: HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::InvocationFailed(format!("HTTP {status}: {text}")));
        }
        response
            .json::<ContractResponse>()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn block(Path((_chain, number)): Path<(String, u64)>) -> Result<Json<RawBlock>, AxumStatus> {
        if number > 2 {
            return Err(AxumStatus::NOT_FOUND);
        }
        Ok(Json(RawBlock {
            number,
            hash: format!("h{number}"),
            ..Default::default()
        }))
    }

    async fn invoke(Json(body): Json<serde_json::Value>) -> Result<Json<ContractResponse>, AxumStatus> {
        if body["contract"] == "locked" {
            return Err(AxumStatus::BAD_REQUEST);
        }
        let first = body["args"][0].as_str().unwrap_or_default().to_string();
        Ok(Json(ContractResponse::ok(first.into_bytes())))
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/channels/:chain/blocks/:number", get(block))
            .route("/channels/:chain/invoke", post(invoke));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_query_block_and_not_found() {
        let client = GatewayLedgerClient::new(serve().await, Duration::from_secs(5)).unwrap();
        let chain = ChainId::from("A");

        let block = client.query_block(&chain, 2).await.unwrap();
        assert_eq!(block.hash, "h2");
        assert!(client.query_block(&chain, 3).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_invoke_hex_args_and_rejection() {
        let client = GatewayLedgerClient::new(serve().await, Duration::from_secs(5)).unwrap();
        let chain = ChainId::from("A");

        let response = client
            .invoke(&chain, "proxy", "NoTransactionCall", vec![vec![0xab, 0xcd]])
            .await
            .unwrap();
        assert_eq!(response.payload, b"abcd".to_vec());

        let err = client.invoke(&chain, "locked", "X", vec![]).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvocationFailed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let client = GatewayLedgerClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        assert!(matches!(
            client.query_block(&"A".into(), 1).await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
