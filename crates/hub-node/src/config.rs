//! # Hub Configuration
//!
//! TOML file, path from `CHAIN_HUB_CONFIG` (default `./config.toml`).
//! `CHAIN_HUB_LISTEN` and `CHAIN_HUB_DB_PATH` override the file.
//!
//! ```toml
//! db_path = "./store"
//!
//! [server]
//! listen = "0.0.0.0:7051"
//! request_timeout_secs = 30
//!
//! [[local]]
//! name = "org1"
//! ledger_gateway = "http://127.0.0.1:8080"
//! [local.csp]
//! algorithm = "sm2"
//! private_key = "<hex or path to a hex file>"
//! [[local.channels]]
//! id = "A"
//! router_contract = "router"
//! proxy_contract = "proxy"
//!
//! [[remote]]
//! name = "org2"
//! address = "http://10.0.0.2:7051"
//! [remote.csp]
//! algorithm = "ecdsa"
//! public_key = "<hex or path to a hex file>"
//! [[remote.channels]]
//! id = "B"
//! ```

use serde::Deserialize;
use shared_crypto::{decode_key_material, ChainKey, CryptoError, CryptoTrustStore, SignatureAlgorithm};
use shared_types::ChainId;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CHAIN_HUB_CONFIG";
pub const LISTEN_ENV: &str = "CHAIN_HUB_LISTEN";
pub const DB_PATH_ENV: &str = "CHAIN_HUB_DB_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate namespace name: {0}")]
    DuplicateNamespace(String),

    #[error("Namespace name must not be empty")]
    EmptyNamespace,

    #[error("Duplicate channel id: {0}")]
    DuplicateChannel(String),

    #[error("Namespace {namespace} has an empty channel id")]
    EmptyChannelId { namespace: String },

    #[error("Local namespace {namespace} has no private key")]
    MissingPrivateKey { namespace: String },

    #[error("Remote namespace {namespace} has no public key")]
    MissingPublicKey { namespace: String },

    #[error("Invalid key for namespace {namespace}: {source}")]
    InvalidKey {
        namespace: String,
        #[source]
        source: CryptoError,
    },

    #[error("Invalid listen address {0}")]
    InvalidListen(String),
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./store")
}

fn default_listen() -> String {
    "0.0.0.0:7051".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Root of the per-chain store directories.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub local: Vec<LocalNamespace>,
    #[serde(default)]
    pub remote: Vec<RemoteNamespace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Per-call deadline of outbound hub and gateway requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Chains hosted by this hub behind one ledger gateway and one key.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalNamespace {
    pub name: String,
    pub ledger_gateway: String,
    pub csp: LocalCsp,
    #[serde(default)]
    pub channels: Vec<LocalChannel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalCsp {
    pub algorithm: SignatureAlgorithm,
    #[serde(default)]
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalChannel {
    pub id: String,
    pub router_contract: String,
    pub proxy_contract: String,
}

/// Chains owned by another hub.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteNamespace {
    pub name: String,
    pub address: String,
    pub csp: RemoteCsp,
    #[serde(default)]
    pub channels: Vec<RemoteChannel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCsp {
    pub algorithm: SignatureAlgorithm,
    #[serde(default)]
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChannel {
    pub id: String,
}

impl HubConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load from `CHAIN_HUB_CONFIG` and apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(&path)?;
        config.apply_overrides(std::env::var(LISTEN_ENV).ok(), std::env::var(DB_PATH_ENV).ok());
        config.listen_addr()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, listen: Option<String>, db_path: Option<String>) {
        if let Some(listen) = listen.filter(|value| !value.is_empty()) {
            self.server.listen = listen;
        }
        if let Some(db_path) = db_path.filter(|value| !value.is_empty()) {
            self.db_path = PathBuf::from(db_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut namespaces = HashSet::new();
        let mut channels = HashSet::new();

        let local = self.local.iter().map(|ns| {
            (&ns.name, ns.channels.iter().map(|c| &c.id).collect::<Vec<_>>())
        });
        let remote = self.remote.iter().map(|ns| {
            (&ns.name, ns.channels.iter().map(|c| &c.id).collect::<Vec<_>>())
        });
        for (name, ids) in local.chain(remote) {
            if name.is_empty() {
                return Err(ConfigError::EmptyNamespace);
            }
            if !namespaces.insert(name.as_str()) {
                return Err(ConfigError::DuplicateNamespace(name.clone()));
            }
            for id in ids {
                if id.is_empty() {
                    return Err(ConfigError::EmptyChannelId {
                        namespace: name.clone(),
                    });
                }
                if !channels.insert(id.as_str()) {
                    return Err(ConfigError::DuplicateChannel(id.clone()));
                }
            }
        }

        for ns in &self.local {
            if ns.csp.private_key.trim().is_empty() {
                return Err(ConfigError::MissingPrivateKey {
                    namespace: ns.name.clone(),
                });
            }
        }
        for ns in &self.remote {
            if ns.csp.public_key.trim().is_empty() {
                return Err(ConfigError::MissingPublicKey {
                    namespace: ns.name.clone(),
                });
            }
        }

        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.server.listen.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs.max(1))
    }

    /// Load every namespace key; a namespace shares one key across its channels.
    pub fn build_trust_store(&self) -> Result<CryptoTrustStore, ConfigError> {
        let mut builder = CryptoTrustStore::builder();

        for ns in &self.local {
            let key = decode_key_material(&ns.csp.private_key)
                .and_then(|bytes| ChainKey::private(ns.csp.algorithm, &bytes))
                .map_err(|source| invalid_key(&ns.name, source))?;
            builder
                .insert(ns.channels.iter().map(|c| ChainId::from(c.id.as_str())), key)
                .map_err(|source| invalid_key(&ns.name, source))?;
        }
        for ns in &self.remote {
            let key = decode_key_material(&ns.csp.public_key)
                .and_then(|bytes| ChainKey::public(ns.csp.algorithm, &bytes))
                .map_err(|source| invalid_key(&ns.name, source))?;
            builder
                .insert(ns.channels.iter().map(|c| ChainId::from(c.id.as_str())), key)
                .map_err(|source| invalid_key(&ns.name, source))?;
        }

        Ok(builder.build())
    }
}

fn invalid_key(namespace: &str, source: CryptoError) -> ConfigError {
    ConfigError::InvalidKey {
        namespace: namespace.to_string(),
        source,
    }
}
