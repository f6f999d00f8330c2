//! # Deadline Retry
//!
//! The hub client re-dials after `DeadlineExceeded`, at most five times,
//! and only returns a response whose signature verifies. Hub 2 refuses
//! requests whose origin signature does not verify.

#[cfg(test)]
mod tests {
    use crate::harness::{chain, memory_store, HubPair, QUERY_CAR1};
    use ch_03_hub_protocol::{HubError, HubStatus, MAX_DEADLINE_RETRIES};
    use shared_types::{CrossChainMessage, HubRequest};

    fn request(tx_id: &str) -> HubRequest {
        HubRequest {
            from: chain("A"),
            to: chain("B"),
            transaction_id: tx_id.into(),
            step_id: "1".into(),
            payload: QUERY_CAR1.as_bytes().to_vec(),
            signer: Vec::new(),
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn test_third_attempt_succeeds_and_verifies() {
        let hubs = HubPair::new();
        hubs.connector
            .fail_next(HubError::deadline_exceeded("deadline exceeded"), 2);

        let response = hubs.client.invoke(request("tx-1")).await.unwrap();

        assert_eq!(hubs.connector.connects(), 3);
        assert!(!response.is_error());
        assert!(hubs
            .csp_a
            .verify(&chain("B"), &response.signer, &response.payload)
            .unwrap());
        // Only the successful attempt reached the destination ledger.
        assert_eq!(hubs.ledger_b.invocations(&chain("B")).len(), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let hubs = HubPair::new();
        hubs.connector
            .fail_next(HubError::deadline_exceeded("deadline exceeded"), 20);

        let err = hubs.client.invoke(request("tx-2")).await.unwrap_err();

        assert_eq!(err.status, HubStatus::DeadlineExceeded);
        assert_eq!(hubs.connector.connects(), 1 + MAX_DEADLINE_RETRIES as usize);
        assert!(hubs.ledger_b.invocations(&chain("B")).is_empty());
    }

    #[tokio::test]
    async fn test_relay_survives_deadlines() {
        let hubs = HubPair::new();
        hubs.connector
            .fail_next(HubError::deadline_exceeded("deadline exceeded"), 2);
        let store = memory_store("A");
        let relay = hubs.relay(store.clone());

        let block = hubs.submit("tx-3", "1", QUERY_CAR1).await;
        let tx_hash = match ch_02_ledger_cursor::extract(&block.envelopes[0], &block) {
            Ok(Some(CrossChainMessage::Invoke(request))) => request.origin.tx_hash,
            other => panic!("expected a request, got {other:?}"),
        };
        relay.process_block(block).await;

        assert!(store.has_seen(&tx_hash).unwrap());
        assert!(hubs
            .ledger_a
            .recorded_result(&chain("A"), "tx-3", "1")
            .is_some());
        assert_eq!(relay.stats().snapshot().requests_relayed, 1);
    }

    #[tokio::test]
    async fn test_forged_request_signature_rejected() {
        let hubs = HubPair::new();
        let mut req = request("tx-4");
        req.signer = vec![0u8; 64];

        let err = hubs.client.invoke(req).await.unwrap_err();
        assert_eq!(err.status, HubStatus::Unauthenticated);
        assert!(err.message.contains("signer invalid"));
    }
}
