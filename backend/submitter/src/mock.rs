//! In-memory gateways for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::form::CreatePoolRequest;
use crate::gateway::{
    explorer_tx_url, ContractGateway, CreatePoolResponse, GatewayError, WalletGateway,
};

pub struct MockWallet {
    identity: Result<Option<String>, GatewayError>,
    on_connect: Option<String>,
}

impl MockWallet {
    pub fn connected(address: &str) -> Self {
        Self {
            identity: Ok(Some(address.to_string())),
            on_connect: Some(address.to_string()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            identity: Ok(None),
            on_connect: None,
        }
    }

    pub fn failing_lookup(message: &str) -> Self {
        Self {
            identity: Err(GatewayError::new(message)),
            on_connect: None,
        }
    }

    /// Approve the next connect prompt with `address`.
    pub fn approving(mut self, address: &str) -> Self {
        self.on_connect = Some(address.to_string());
        self
    }
}

#[async_trait]
impl WalletGateway for MockWallet {
    async fn identity(&self) -> Result<Option<String>, GatewayError> {
        self.identity.clone()
    }

    async fn connect(&self) -> Result<Option<String>, GatewayError> {
        Ok(self.on_connect.clone())
    }
}

/// Contract gateway answering from a FIFO queue of canned results.
///
/// With [`MockContract::held`] every call waits on the returned [`Notify`]
/// before answering, which keeps a submission in flight for as long as a
/// test needs.
#[derive(Default)]
pub struct MockContract {
    responses: Mutex<VecDeque<Result<CreatePoolResponse, GatewayError>>>,
    requests: Mutex<Vec<CreatePoolRequest>>,
    calls: AtomicUsize,
    hold: Option<Arc<Notify>>,
}

impl MockContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        let mock = Self {
            hold: Some(notify.clone()),
            ..Self::default()
        };
        (mock, notify)
    }

    pub fn push_ok(&self, tx_hash: &str, pool_id: Option<u64>) {
        self.push(Ok(CreatePoolResponse {
            tx_hash: tx_hash.to_string(),
            pool_id,
        }));
    }

    pub fn push_err(&self, message: &str) {
        self.push(Err(GatewayError::new(message)));
    }

    fn push(&self, result: Result<CreatePoolResponse, GatewayError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(result);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CreatePoolRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContractGateway for MockContract {
    async fn create_pool(
        &self,
        request: &CreatePoolRequest,
    ) -> Result<CreatePoolResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        self.responses
            .lock()
            .map_err(|e| GatewayError::new(format!("mutex poisoned: {e}")))?
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::new("no mock response")))
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        explorer_tx_url("https://stellar.expert/explorer", "testnet", tx_hash)
    }
}
