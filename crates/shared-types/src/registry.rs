//! # Chain Registry
//!
//! Immutable map of every chain the hub knows about, built once at startup
//! before any relay loop runs.
//!
//! A chain is either **local** (this hub reads its ledger and invokes its
//! contracts directly) or **remote** (reachable only through another hub).

use crate::entities::ChainId;
use crate::ledger::LedgerClient;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Registry construction errors. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Chain {0} is registered twice")]
    DuplicateChain(ChainId),

    #[error("Chain id must not be empty")]
    EmptyChainId,

    #[error("Chain {0} is not registered")]
    UnknownChain(ChainId),

    #[error("Chain {0} is not hosted by this hub")]
    NotLocal(ChainId),
}

/// A chain hosted by this hub.
#[derive(Clone)]
pub struct LocalChain {
    /// Ledger client serving this chain.
    pub ledger: Arc<dyn LedgerClient>,
    /// Routing contract recording requests and results.
    pub router_contract: String,
    /// Proxy contract for pass-through calls.
    pub proxy_contract: String,
}

/// A chain reachable through another hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChain {
    /// Name of the owning hub, for logs.
    pub hub: String,
    /// Base URL of the owning hub's RPC endpoint.
    pub endpoint: String,
}

/// Local or remote.
#[derive(Clone)]
pub enum ChainRole {
    Local(LocalChain),
    Remote(RemoteChain),
}

impl fmt::Debug for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRole::Local(local) => f
                .debug_struct("Local")
                .field("router_contract", &local.router_contract)
                .field("proxy_contract", &local.proxy_contract)
                .finish_non_exhaustive(),
            ChainRole::Remote(remote) => remote.fmt(f),
        }
    }
}

/// Static configuration of one chain.
#[derive(Debug, Clone)]
pub struct ChainRegistration {
    pub id: ChainId,
    pub role: ChainRole,
}

impl ChainRegistration {
    /// Register a locally hosted chain.
    pub fn local(
        id: impl Into<ChainId>,
        ledger: Arc<dyn LedgerClient>,
        router_contract: impl Into<String>,
        proxy_contract: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: ChainRole::Local(LocalChain {
                ledger,
                router_contract: router_contract.into(),
                proxy_contract: proxy_contract.into(),
            }),
        }
    }

    /// Register a chain owned by another hub.
    pub fn remote(
        id: impl Into<ChainId>,
        hub: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: ChainRole::Remote(RemoteChain {
                hub: hub.into(),
                endpoint: endpoint.into(),
            }),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.role, ChainRole::Local(_))
    }
}

/// Immutable chain registry.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<ChainId, ChainRegistration>,
}

impl ChainRegistry {
    /// Start building a registry.
    pub fn builder() -> ChainRegistryBuilder {
        ChainRegistryBuilder::default()
    }

    /// Look up a chain.
    pub fn get(&self, id: &ChainId) -> Option<&ChainRegistration> {
        self.chains.get(id)
    }

    /// Whether `id` is registered at all.
    pub fn contains(&self, id: &ChainId) -> bool {
        self.chains.contains_key(id)
    }

    /// Whether `id` is hosted by this hub.
    pub fn is_local(&self, id: &ChainId) -> bool {
        self.get(id).is_some_and(ChainRegistration::is_local)
    }

    /// Local chain handle, or an error naming why it is unavailable.
    pub fn local(&self, id: &ChainId) -> Result<&LocalChain, RegistryError> {
        match self.get(id).map(|reg| &reg.role) {
            Some(ChainRole::Local(local)) => Ok(local),
            Some(ChainRole::Remote(_)) => Err(RegistryError::NotLocal(id.clone())),
            None => Err(RegistryError::UnknownChain(id.clone())),
        }
    }

    /// Remote chain handle, if `id` is remote.
    pub fn remote(&self, id: &ChainId) -> Option<&RemoteChain> {
        match self.get(id).map(|reg| &reg.role) {
            Some(ChainRole::Remote(remote)) => Some(remote),
            _ => None,
        }
    }

    /// Ids of all local chains, sorted.
    pub fn local_chains(&self) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = self
            .chains
            .values()
            .filter(|reg| reg.is_local())
            .map(|reg| reg.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Ids of every registered chain, sorted.
    pub fn chain_ids(&self) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = self.chains.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Builder rejecting duplicate and empty ids.
#[derive(Debug, Default)]
pub struct ChainRegistryBuilder {
    chains: HashMap<ChainId, ChainRegistration>,
}

impl ChainRegistryBuilder {
    /// Add a registration.
    pub fn register(&mut self, registration: ChainRegistration) -> Result<&mut Self, RegistryError> {
        if registration.id.is_empty() {
            return Err(RegistryError::EmptyChainId);
        }
        if self.chains.contains_key(&registration.id) {
            return Err(RegistryError::DuplicateChain(registration.id));
        }
        self.chains.insert(registration.id.clone(), registration);
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> ChainRegistry {
        ChainRegistry {
            chains: self.chains,
        }
    }
}
