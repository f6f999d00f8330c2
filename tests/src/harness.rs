//! # Two-Hub Fixture
//!
//! Hub 1 hosts chain `A`, hub 2 hosts chain `B`. Each hub owns an
//! in-memory ledger and a trust store holding its own private key and the
//! peer's public key. Hub 1 reaches hub 2 through a [`MockHubConnector`],
//! so transport failures can be scripted.

use ch_01_block_store::{BlockStoreApi, BlockStoreService, InMemoryKVStore};
use ch_02_ledger_cursor::InMemoryLedger;
use ch_03_hub_protocol::{
    HubClient, HubExecutor, HubService, LoopbackConnector, MockHubConnector, RegistryConnector,
};
use ch_04_relay::RelayLoop;
use parking_lot::Mutex;
use shared_crypto::{ChainKey, CryptoTrustStore, SignatureAlgorithm};
use shared_types::{
    ChainId, ChainRegistration, ChainRegistry, LedgerClient, RawBlock, FN_CHAINCODE_INVOKE,
};
use std::sync::Arc;
use std::time::Duration;

pub const ROUTER: &str = "router";
pub const PROXY: &str = "proxy";

/// `fabcar.QueryCar("CAR1")` with an `audit.Record` callback.
pub const QUERY_CAR1: &str = r#"{"chaincode":"fabcar","fn":"QueryCar","args":["CAR1"],"callback":{"chaincode":"audit","fn":"Record","args":["CAR1","done"]}}"#;

pub const CAR1: &str = r#"{"make":"Toyota","model":"Prius","colour":"blue","owner":"Tomoko"}"#;

/// Relay retry interval used by the scenarios.
pub const FAST_BACKOFF: Duration = Duration::from_millis(10);

pub fn chain(id: &str) -> ChainId {
    ChainId::from(id)
}

/// Ledger of chain `A` with the `audit` callback chaincode deployed.
pub fn origin_ledger(audit: Arc<Mutex<Vec<Vec<String>>>>) -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.add_chain("A", ROUTER, PROXY);
    ledger
        .register_chaincode(&chain("A"), "audit", move |_, args| {
            audit.lock().push(args.to_vec());
            Ok(Vec::new())
        })
        .expect("chain A exists");
    ledger
}

/// Ledger of chain `B` with `fabcar` deployed.
pub fn destination_ledger() -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.add_chain("B", ROUTER, PROXY);
    ledger
        .register_chaincode(&chain("B"), "fabcar", |function, args| match (function, args) {
            ("QueryCar", [car]) if car == "CAR1" => Ok(CAR1.as_bytes().to_vec()),
            _ => Err(format!("{function}: car not found")),
        })
        .expect("chain B exists");
    ledger
}

/// Trust stores of hub 1 and hub 2.
pub fn trust_stores() -> (Arc<CryptoTrustStore>, Arc<CryptoTrustStore>) {
    let key_a = ChainKey::generate(SignatureAlgorithm::Sm2).expect("sm2 key");
    let key_b = ChainKey::generate(SignatureAlgorithm::Ecdsa).expect("ecdsa key");

    let mut hub1 = CryptoTrustStore::builder();
    hub1.insert([chain("A")], ChainKey::private(SignatureAlgorithm::Sm2, &private_bytes(&key_a)).expect("key a"))
        .expect("insert a")
        .insert([chain("B")], key_b.to_public())
        .expect("insert b");

    let mut hub2 = CryptoTrustStore::builder();
    hub2.insert([chain("B")], key_b)
        .expect("insert b")
        .insert([chain("A")], key_a.to_public())
        .expect("insert a");

    (Arc::new(hub1.build()), Arc::new(hub2.build()))
}

fn private_bytes(key: &ChainKey) -> Vec<u8> {
    match key {
        ChainKey::EcdsaPrivate(pair) => pair.to_bytes().to_vec(),
        ChainKey::Sm2Private(pair) => pair.to_bytes(),
        _ => Vec::new(),
    }
}

pub fn memory_store(id: &str) -> Arc<dyn BlockStoreApi> {
    Arc::new(BlockStoreService::new(chain(id), InMemoryKVStore::new()))
}

pub struct HubPair {
    pub ledger_a: Arc<InMemoryLedger>,
    pub ledger_b: Arc<InMemoryLedger>,
    pub csp_a: Arc<CryptoTrustStore>,
    pub csp_b: Arc<CryptoTrustStore>,
    pub registry_a: Arc<ChainRegistry>,
    /// Hub 1's transport to hub 2.
    pub connector: MockHubConnector,
    pub client: Arc<HubClient>,
    pub audit: Arc<Mutex<Vec<Vec<String>>>>,
}

impl HubPair {
    pub fn new() -> Self {
        let audit = Arc::new(Mutex::new(Vec::new()));
        let ledger_a = origin_ledger(Arc::clone(&audit));
        let ledger_b = destination_ledger();
        let (csp_a, csp_b) = trust_stores();

        let mut registry_b = ChainRegistry::builder();
        registry_b
            .register(ChainRegistration::local("B", ledger_b.clone(), ROUTER, PROXY))
            .expect("register B")
            .register(ChainRegistration::remote("A", "hub1", "http://127.0.0.1:1"))
            .expect("register A");
        let registry_b = Arc::new(registry_b.build());
        let executor_b = Arc::new(HubExecutor::new(Arc::clone(&registry_b), Arc::clone(&csp_b)));
        let client_b = Arc::new(HubClient::new(
            Arc::clone(&csp_b),
            Arc::new(RegistryConnector::new(
                Arc::clone(&registry_b),
                Arc::new(LoopbackConnector::new(Arc::clone(&executor_b))),
                Duration::from_secs(1),
            )),
        ));
        let hub2 = Arc::new(HubService::new(executor_b, client_b));

        let mut registry_a = ChainRegistry::builder();
        registry_a
            .register(ChainRegistration::local("A", ledger_a.clone(), ROUTER, PROXY))
            .expect("register A")
            .register(ChainRegistration::remote("B", "hub2", "http://127.0.0.1:1"))
            .expect("register B");

        let connector = MockHubConnector::new(hub2);
        let client = Arc::new(HubClient::new(Arc::clone(&csp_a), Arc::new(connector.clone())));

        Self {
            ledger_a,
            ledger_b,
            csp_a,
            csp_b,
            registry_a: Arc::new(registry_a.build()),
            connector,
            client,
            audit,
        }
    }

    /// Relay loop of chain `A` over `store`.
    pub fn relay(&self, store: Arc<dyn BlockStoreApi>) -> RelayLoop {
        RelayLoop::new(chain("A"), &self.registry_a, store, self.client.clone())
            .expect("A is local")
            .with_backoff(FAST_BACKOFF)
    }

    /// Register a request on A's router; returns the block carrying it.
    pub async fn submit(&self, tx_id: &str, step_id: &str, payload: &str) -> RawBlock {
        submit_request(&self.ledger_a, "A", "B", tx_id, step_id, payload).await
    }

    pub fn audit_calls(&self) -> Vec<Vec<String>> {
        self.audit.lock().clone()
    }
}

impl Default for HubPair {
    fn default() -> Self {
        Self::new()
    }
}

/// Call `ChainCodeInvoke` on `from`'s router and return the committed block.
pub async fn submit_request(
    ledger: &InMemoryLedger,
    from: &str,
    to: &str,
    tx_id: &str,
    step_id: &str,
    payload: &str,
) -> RawBlock {
    let args = [from, to, tx_id, step_id, payload, ""]
        .iter()
        .map(|arg| arg.as_bytes().to_vec())
        .collect();
    let response = ledger
        .invoke(&chain(from), ROUTER, FN_CHAINCODE_INVOKE, args)
        .await
        .expect("router accepts request");
    assert!(response.is_ok(), "router rejected request: {}", response.message);

    let height = ledger.height(&chain(from));
    ledger
        .query_block(&chain(from), height)
        .await
        .expect("committed block")
}

/// Poll `condition` every 10ms for up to five seconds.
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
