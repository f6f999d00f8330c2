//! # Outbound Ports
//!
//! Transport abstraction used by the hub client. A connector dials the hub
//! serving a destination chain; the connection carries one or more `invoke`
//! calls. The client re-dials after a deadline error.

use crate::domain::errors::HubError;
use crate::ports::inbound::HubProtocolApi;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ChainId, HubRequest, HubResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Dials the hub that serves `target`.
#[async_trait]
pub trait HubConnector: Send + Sync {
    async fn connect(&self, target: &ChainId) -> Result<Box<dyn HubConnection>, HubError>;
}

/// An established transport to a hub.
#[async_trait]
pub trait HubConnection: Send + Sync {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

struct MockState {
    delegate: Arc<dyn HubProtocolApi>,
    scripted_errors: Mutex<VecDeque<HubError>>,
    requests: Mutex<Vec<HubRequest>>,
    connects: AtomicUsize,
}

/// Connector that hands calls to an in-process hub, after first failing
/// with any scripted errors.
#[derive(Clone)]
pub struct MockHubConnector {
    state: Arc<MockState>,
}

impl MockHubConnector {
    pub fn new(delegate: Arc<dyn HubProtocolApi>) -> Self {
        Self {
            state: Arc::new(MockState {
                delegate,
                scripted_errors: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                connects: AtomicUsize::new(0),
            }),
        }
    }

    /// Fail the next `times` calls with `error`.
    pub fn fail_next(&self, error: HubError, times: usize) {
        let mut scripted = self.state.scripted_errors.lock();
        for _ in 0..times {
            scripted.push_back(error.clone());
        }
    }

    /// Number of `connect` calls so far.
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Every request that reached the transport, failed ones included.
    pub fn requests(&self) -> Vec<HubRequest> {
        self.state.requests.lock().clone()
    }
}

#[async_trait]
impl HubConnector for MockHubConnector {
    async fn connect(&self, _target: &ChainId) -> Result<Box<dyn HubConnection>, HubError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockHubConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockHubConnection {
    state: Arc<MockState>,
}

#[async_trait]
impl HubConnection for MockHubConnection {
    async fn invoke(&self, request: HubRequest) -> Result<HubResponse, HubError> {
        self.state.requests.lock().push(request.clone());
        let scripted = self.state.scripted_errors.lock().pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }
        self.state.delegate.invoke(request).await
    }
}
