//! # Two Hubs over HTTP
//!
//! Full runtimes on loopback sockets: hub 1 relays chain `A`, hub 2 serves
//! chain `B`, and the request crosses the real axum/reqwest transport.

#[cfg(test)]
mod tests {
    use crate::harness::{
        chain, destination_ledger, origin_ledger, submit_request, trust_stores, wait_until,
        FAST_BACKOFF, PROXY, QUERY_CAR1, ROUTER,
    };
    use hub_node::HubRuntime;
    use parking_lot::Mutex;
    use shared_types::{ChainRegistration, ChainRegistry};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_request_crosses_http_transport() {
        let listener_1 = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener_2 = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let hub1_url = format!("http://{}", listener_1.local_addr().unwrap());
        let hub2_url = format!("http://{}", listener_2.local_addr().unwrap());

        let audit = Arc::new(Mutex::new(Vec::new()));
        let ledger_a = origin_ledger(Arc::clone(&audit));
        let ledger_b = destination_ledger();
        let (csp_1, csp_2) = trust_stores();

        let mut registry_1 = ChainRegistry::builder();
        registry_1
            .register(ChainRegistration::local("A", ledger_a.clone(), ROUTER, PROXY))
            .unwrap()
            .register(ChainRegistration::remote("B", "hub2", hub2_url.as_str()))
            .unwrap();
        let mut registry_2 = ChainRegistry::builder();
        registry_2
            .register(ChainRegistration::local("B", ledger_b.clone(), ROUTER, PROXY))
            .unwrap()
            .register(ChainRegistration::remote("A", "hub1", hub1_url.as_str()))
            .unwrap();

        let dir_1 = tempfile::tempdir().unwrap();
        let dir_2 = tempfile::tempdir().unwrap();
        let hub_1 = HubRuntime::new(
            Arc::new(registry_1.build()),
            csp_1,
            Duration::from_secs(2),
            dir_1.path().to_path_buf(),
            listener_1.local_addr().unwrap(),
        )
        .with_relay_backoff(FAST_BACKOFF);
        let hub_2 = HubRuntime::new(
            Arc::new(registry_2.build()),
            csp_2,
            Duration::from_secs(2),
            dir_2.path().to_path_buf(),
            listener_2.local_addr().unwrap(),
        )
        .with_relay_backoff(FAST_BACKOFF);

        let (stop_1, rx_1) = oneshot::channel::<()>();
        let (stop_2, rx_2) = oneshot::channel::<()>();
        let task_1 = tokio::spawn(hub_1.run_on(listener_1, async move {
            let _ = rx_1.await;
        }));
        let task_2 = tokio::spawn(hub_2.run_on(listener_2, async move {
            let _ = rx_2.await;
        }));

        submit_request(&ledger_a, "A", "B", "tx-http", "1", QUERY_CAR1).await;

        assert!(
            wait_until(|| ledger_a
                .recorded_result(&chain("A"), "tx-http", "1")
                .is_some())
            .await
        );
        assert!(wait_until(|| audit.lock().len() == 1).await);
        assert_eq!(ledger_b.invocations(&chain("B")).len(), 1);

        stop_1.send(()).unwrap();
        stop_2.send(()).unwrap();
        let stats_1 = task_1.await.unwrap().unwrap();
        let stats_2 = task_2.await.unwrap().unwrap();

        assert_eq!(stats_1.len(), 1);
        assert_eq!(stats_1[0].requests_relayed, 1);
        assert_eq!(stats_2[0].requests_relayed, 0);
        assert!(dir_1.path().join("A").is_dir());
    }
}
