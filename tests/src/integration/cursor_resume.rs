//! # Cursor Resumption
//!
//! After N blocks are persisted, a restarted hub resumes at N+1 and never
//! relays a persisted request again.

#[cfg(test)]
mod tests {
    use crate::harness::{chain, HubPair, QUERY_CAR1};
    use ch_01_block_store::{BlockStoreApi, BlockStoreService, FileBackedKVStore};
    use ch_02_ledger_cursor::LedgerCursor;
    use std::path::Path;
    use std::sync::Arc;
    use tokio::sync::watch;

    fn file_store(dir: &Path) -> Arc<dyn BlockStoreApi> {
        let kv = FileBackedKVStore::open(dir.join("blocks.db")).unwrap();
        Arc::new(BlockStoreService::new(chain("A"), kv))
    }

    #[tokio::test]
    async fn test_cursor_resumes_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let hubs = HubPair::new();
        let mut blocks = Vec::new();
        for tx in ["tx-1", "tx-2", "tx-3"] {
            blocks.push(hubs.submit(tx, "1", QUERY_CAR1).await);
        }

        {
            let relay = hubs.relay(file_store(dir.path()));
            relay.process_block(blocks[0].clone()).await;
            relay.process_block(blocks[1].clone()).await;
        }

        let store = file_store(dir.path());
        assert_eq!(store.latest_block_number(&chain("A")).unwrap(), 2);

        let mut cursor = LedgerCursor::new(chain("A"), hubs.ledger_a.clone(), store);
        let next = cursor.fetch_next().await;
        assert_eq!(next.number, 3);
        assert_eq!(next.hash, blocks[2].hash);
        assert_eq!(cursor.position(), Some(3));
    }

    #[tokio::test]
    async fn test_restarted_loop_relays_only_new_requests() {
        let dir = tempfile::tempdir().unwrap();
        let hubs = HubPair::new();
        let first = hubs.submit("tx-1", "1", QUERY_CAR1).await;
        hubs.relay(file_store(dir.path())).process_block(first).await;
        assert_eq!(hubs.connector.requests().len(), 1);

        hubs.submit("tx-2", "1", QUERY_CAR1).await;

        let relay = hubs.relay(file_store(dir.path()));
        let stats = relay.stats();
        let (stop, rx) = watch::channel(false);
        let handle = tokio::spawn(relay.run(rx));
        assert!(crate::harness::wait_until(|| stats.snapshot().blocks_processed == 1).await);
        stop.send(true).unwrap();
        handle.await.unwrap();

        let sent: Vec<String> = hubs
            .connector
            .requests()
            .into_iter()
            .map(|request| request.transaction_id)
            .collect();
        assert_eq!(sent, vec!["tx-1".to_string(), "tx-2".to_string()]);
        assert_eq!(hubs.audit_calls().len(), 2);
    }
}
