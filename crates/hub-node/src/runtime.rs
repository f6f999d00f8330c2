//! # Hub Runtime
//!
//! Wires the subsystems of one hub.
//!
//! ## Startup Sequence
//!
//! 1. Build the trust store and chain registry (immutable afterwards)
//! 2. Wire executor, loopback/HTTP transports, client and service
//! 3. Open one store per local chain under `<db_path>/<chain>`
//! 4. Serve the hub RPC and spawn one relay loop per local chain
//!
//! ## Shutdown Sequence
//!
//! 1. Flip the watch channel; loops stop before their next fetch
//! 2. Wait for in-flight blocks, up to [`SHUTDOWN_GRACE`]
//! 3. Stop the HTTP server

use crate::config::HubConfig;
use anyhow::{Context, Result};
use ch_01_block_store::{BlockStoreApi, BlockStoreService};
use ch_02_ledger_cursor::GatewayLedgerClient;
use ch_03_hub_protocol::{
    HubClient, HubExecutor, HubProtocolApi, HubService, LoopbackConnector, RegistryConnector,
};
use ch_04_relay::{RelayLoop, RelayStatsSnapshot};
use shared_crypto::CryptoTrustStore;
use shared_types::{ChainId, ChainRegistration, ChainRegistry, LedgerClient};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long in-flight relay work may take after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub struct HubRuntime {
    registry: Arc<ChainRegistry>,
    client: Arc<HubClient>,
    service: Arc<HubService>,
    db_path: PathBuf,
    listen: SocketAddr,
    relay_backoff: Option<Duration>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HubRuntime {
    /// Build a runtime from configuration, with one ledger gateway client
    /// per local namespace.
    pub fn from_config(config: &HubConfig) -> Result<Self> {
        let csp = config
            .build_trust_store()
            .context("failed to load chain keys")?;

        let mut registry = ChainRegistry::builder();
        for ns in &config.local {
            let ledger: Arc<dyn LedgerClient> = Arc::new(
                GatewayLedgerClient::new(ns.ledger_gateway.clone(), config.request_timeout())
                    .with_context(|| format!("invalid ledger gateway for {}", ns.name))?,
            );
            for channel in &ns.channels {
                registry
                    .register(ChainRegistration::local(
                        channel.id.as_str(),
                        Arc::clone(&ledger),
                        channel.router_contract.as_str(),
                        channel.proxy_contract.as_str(),
                    ))
                    .with_context(|| format!("failed to register chain {}", channel.id))?;
            }
        }
        for ns in &config.remote {
            for channel in &ns.channels {
                registry
                    .register(ChainRegistration::remote(
                        channel.id.as_str(),
                        ns.name.as_str(),
                        ns.address.as_str(),
                    ))
                    .with_context(|| format!("failed to register chain {}", channel.id))?;
            }
        }

        Ok(Self::new(
            Arc::new(registry.build()),
            Arc::new(csp),
            config.request_timeout(),
            config.db_path.clone(),
            config.listen_addr()?,
        ))
    }

    pub fn new(
        registry: Arc<ChainRegistry>,
        csp: Arc<CryptoTrustStore>,
        request_timeout: Duration,
        db_path: PathBuf,
        listen: SocketAddr,
    ) -> Self {
        let executor = Arc::new(HubExecutor::new(Arc::clone(&registry), Arc::clone(&csp)));
        let connector = RegistryConnector::new(
            Arc::clone(&registry),
            Arc::new(LoopbackConnector::new(Arc::clone(&executor))),
            request_timeout,
        );
        let client = Arc::new(HubClient::new(csp, Arc::new(connector)));
        let service = Arc::new(HubService::new(executor, Arc::clone(&client)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            registry,
            client,
            service,
            db_path,
            listen,
            relay_backoff: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Override the relay retry interval.
    pub fn with_relay_backoff(mut self, delay: Duration) -> Self {
        self.relay_backoff = Some(delay);
        self
    }

    pub fn service(&self) -> Arc<dyn HubProtocolApi> {
        self.service.clone()
    }

    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// Open the store of a local chain.
    pub fn open_store(&self, chain: &ChainId) -> Result<Arc<dyn BlockStoreApi>> {
        let dir = self.db_path.join(chain.as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        open_backend(chain, dir)
    }

    /// Build the relay loop of every local chain.
    pub fn relay_loops(&self) -> Result<Vec<RelayLoop>> {
        self.registry
            .local_chains()
            .into_iter()
            .map(|chain| {
                let store = self.open_store(&chain)?;
                let relay = RelayLoop::new(chain.clone(), &self.registry, store, self.client.clone())
                    .with_context(|| format!("failed to build relay loop for {chain}"))?;
                Ok(match self.relay_backoff {
                    Some(delay) => relay.with_backoff(delay),
                    None => relay,
                })
            })
            .collect()
    }

    /// Serve and relay until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<Vec<RelayStatsSnapshot>>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.listen)
            .await
            .with_context(|| format!("failed to bind {}", self.listen))?;
        self.run_on(listener, shutdown).await
    }

    /// Like [`HubRuntime::run`] on an already bound listener.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<Vec<RelayStatsSnapshot>>
    where
        F: Future<Output = ()>,
    {
        let loops = self.relay_loops()?;

        let mut server_shutdown = self.shutdown_rx.clone();
        let server = tokio::spawn(ch_03_hub_protocol::serve(listener, self.service(), async move {
            let _ = server_shutdown.changed().await;
        }));

        let handles: Vec<(ChainId, JoinHandle<RelayStatsSnapshot>)> = loops
            .into_iter()
            .map(|relay| {
                let chain = relay.chain().clone();
                let handle = tokio::spawn(relay.run(self.shutdown_rx.clone()));
                (chain, handle)
            })
            .collect();
        info!(chains = handles.len(), "[hub] Hub is running");

        shutdown.await;
        info!("[hub] Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!(error = %e, "[hub] Failed to send shutdown signal");
        }

        let mut stats = Vec::with_capacity(handles.len());
        for (chain, handle) in handles {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(snapshot)) => stats.push(snapshot),
                Ok(Err(e)) => error!(chain = %chain, error = %e, "[hub] Relay loop panicked"),
                Err(_) => warn!(chain = %chain, "[hub] Relay loop did not stop in time"),
            }
        }

        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "[hub] Hub RPC server failed"),
            Err(e) => error!(error = %e, "[hub] Hub RPC server panicked"),
        }

        info!("[hub] Shutdown complete");
        Ok(stats)
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_backend(chain: &ChainId, dir: PathBuf) -> Result<Arc<dyn BlockStoreApi>> {
    let path = dir.join("blocks.db");
    let kv = ch_01_block_store::FileBackedKVStore::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Arc::new(BlockStoreService::new(chain.clone(), kv)))
}

#[cfg(feature = "rocksdb")]
fn open_backend(chain: &ChainId, dir: PathBuf) -> Result<Arc<dyn BlockStoreApi>> {
    let kv = ch_01_block_store::RocksDbStore::open(ch_01_block_store::RocksDbConfig::at(&dir))
        .with_context(|| format!("failed to open {}", dir.display()))?;
    Ok(Arc::new(BlockStoreService::new(chain.clone(), kv)))
}
