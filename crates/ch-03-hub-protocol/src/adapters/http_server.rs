//! # HTTP Server
//!
//! Serves the hub RPC over HTTP:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/hub/invoke` | `HubRequest` JSON → `HubResponse` JSON |
//! | GET | `/health` | status JSON |
//!
//! Failures answer with the status's HTTP code and a `HubError` JSON body.

use crate::domain::errors::HubError;
use crate::ports::inbound::HubProtocolApi;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared_types::HubRequest;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const INVOKE_PATH: &str = "/hub/invoke";
pub const HEALTH_PATH: &str = "/health";

/// Build the hub router around `api`.
pub fn hub_router(api: Arc<dyn HubProtocolApi>) -> Router {
    Router::new()
        .route(INVOKE_PATH, post(handle_invoke))
        .route(HEALTH_PATH, get(health_check))
        .with_state(api)
}

/// Serve `api` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    api: Arc<dyn HubProtocolApi>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "[ch-03] Hub RPC listening");
    }
    axum::serve(listener, hub_router(api))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_invoke(State(api): State<Arc<dyn HubProtocolApi>>, body: String) -> Response {
    let request: HubRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return error_response(HubError::invalid_argument(format!("parse error: {e}")));
        }
    };

    match api.invoke(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            warn!(status = %err.status, error = %err.message, "[ch-03] Invoke rejected");
            error_response(err)
        }
    }
}

fn error_response(err: HubError) -> Response {
    let code =
        StatusCode::from_u16(err.status.http_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(err)).into_response()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "chain-hub",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
