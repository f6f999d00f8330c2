//! # Relay Flows
//!
//! A → B request through hub 1's relay loop and hub 2's service:
//!
//! 1. Happy path: proxy call on B, signed 200 result recorded on A, callback run
//! 2. Duplicate block replay: no second dispatch, record or callback
//! 3. Application error on B travels back as a signed 500 result

#[cfg(test)]
mod tests {
    use crate::harness::{chain, memory_store, HubPair, CAR1, QUERY_CAR1};
    use ch_02_ledger_cursor::Invocation;
    use shared_types::{
        ContractResponse, LedgerClient, FN_NO_TRANSACTION_CALL, STATUS_ERROR, STATUS_OK,
    };
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_happy_path_a_to_b() {
        let hubs = HubPair::new();
        let store = memory_store("A");
        let relay = hubs.relay(store.clone());

        let block = hubs.submit("tx-100", "1", QUERY_CAR1).await;
        let tx_hash = block.envelopes[0].tx_hash.clone().unwrap();
        relay.process_block(block.clone()).await;

        // Destination proxy saw the pass-through call.
        let calls = hubs.ledger_b.invocations(&chain("B"));
        assert_eq!(
            calls,
            vec![Invocation {
                contract: "proxy".into(),
                function: FN_NO_TRANSACTION_CALL.into(),
                args: vec![
                    b"fabcar".to_vec(),
                    b"QueryCar".to_vec(),
                    br#"["CAR1"]"#.to_vec(),
                ],
            }]
        );

        // Result recorded on the origin router, signed by B.
        let recorded = hubs
            .ledger_a
            .recorded_result(&chain("A"), "tx-100", "1")
            .unwrap();
        assert!(recorded.message.is_empty());
        let contract: ContractResponse = serde_json::from_str(&recorded.payload).unwrap();
        assert_eq!(contract.status, STATUS_OK);
        assert_eq!(contract.payload, CAR1.as_bytes());
        let signature = hex::decode(&recorded.signer).unwrap();
        assert!(hubs
            .csp_a
            .verify(&chain("B"), &signature, recorded.payload.as_bytes())
            .unwrap());

        // Callback ran on A.
        assert_eq!(
            hubs.audit_calls(),
            vec![vec!["CAR1".to_string(), "done".to_string()]]
        );

        // Dedup record and block persisted.
        let record = store.get_transaction(&tx_hash).unwrap().unwrap();
        assert_eq!(record.block_number, block.number);
        assert_eq!(record.block_hash, block.hash);
        assert_eq!(store.latest_block_number(&chain("A")).unwrap(), block.number);
        assert_eq!(relay.stats().snapshot().requests_relayed, 1);
    }

    #[tokio::test]
    async fn test_duplicate_block_replay() {
        let hubs = HubPair::new();
        let store = memory_store("A");
        let relay = hubs.relay(store.clone());

        let block = hubs.submit("tx-200", "1", QUERY_CAR1).await;
        relay.process_block(block.clone()).await;
        relay.process_block(block.clone()).await;

        let stats = relay.stats().snapshot();
        assert_eq!(stats.requests_relayed, 1);
        assert_eq!(stats.duplicates_skipped, 1);
        assert_eq!(stats.blocks_processed, 2);
        assert_eq!(hubs.connector.requests().len(), 1);
        assert_eq!(hubs.ledger_b.invocations(&chain("B")).len(), 1);
        assert_eq!(hubs.audit_calls().len(), 1);

        let stored = store.get_block_by_number(&chain("A"), block.number).unwrap().unwrap();
        assert_eq!(stored.hash, block.hash);
    }

    #[tokio::test]
    async fn test_destination_failure_recorded_as_error() {
        let hubs = HubPair::new();
        hubs.ledger_b
            .lock_resource(&chain("B"), "fabcar", "tx-earlier")
            .unwrap();
        let relay = hubs.relay(memory_store("A"));

        let block = hubs.submit("tx-300", "2", QUERY_CAR1).await;
        relay.process_block(block).await;

        let recorded = hubs
            .ledger_a
            .recorded_result(&chain("A"), "tx-300", "2")
            .unwrap();
        assert!(recorded.message.contains("locked by unfinished transaction"));
        let contract: ContractResponse = serde_json::from_str(&recorded.payload).unwrap();
        assert_eq!(contract.status, STATUS_ERROR);
        // The callback still runs; the contract decides what an error means.
        assert_eq!(hubs.audit_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_blocks_without_requests_are_persisted() {
        let hubs = HubPair::new();
        let store = memory_store("A");
        hubs.ledger_a.append_block(&chain("A"), Vec::new()).unwrap();
        hubs.submit("tx-400", "1", QUERY_CAR1).await;

        let relay = hubs.relay(store.clone());
        let stats = relay.stats();
        let (stop, rx) = watch::channel(false);
        let handle = tokio::spawn(relay.run(rx));

        assert!(crate::harness::wait_until(|| stats.snapshot().blocks_processed == 2).await);
        stop.send(true).unwrap();
        let totals = handle.await.unwrap();

        assert_eq!(totals.requests_relayed, 1);
        assert_eq!(store.latest_block_number(&chain("A")).unwrap(), 2);
        let first = store.get_block_by_number(&chain("A"), 1).unwrap().unwrap();
        let second = hubs.ledger_a.query_block(&chain("A"), 2).await.unwrap();
        assert_eq!(first.next_hash.as_deref(), Some(second.hash.as_str()));
    }
}
