//! # chain-hub
//!
//! Loads the configuration, starts the hub and relays until Ctrl+C.

use anyhow::{Context, Result};
use hub_node::{HubConfig, HubRuntime};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = HubConfig::from_env().context("failed to load configuration")?;
    info!(
        listen = %config.server.listen,
        db_path = %config.db_path.display(),
        local = config.local.len(),
        remote = config.remote.len(),
        "[hub] Configuration loaded"
    );

    let runtime = HubRuntime::from_config(&config)?;
    let stats = runtime
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "[hub] Failed to listen for Ctrl+C");
            }
        })
        .await?;

    for snapshot in stats {
        info!(
            blocks = snapshot.blocks_processed,
            relayed = snapshot.requests_relayed,
            duplicates = snapshot.duplicates_skipped,
            dropped = snapshot.dispatch_failures,
            "[hub] Relay totals"
        );
    }
    Ok(())
}
