//! Connected-wallet session.
//!
//! A single [`WalletSession`] is built at startup and shared by reference
//! with the controller and the API. Its status lives in a watch channel so
//! observers see every change.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::gateway::{GatewayError, WalletGateway};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "address", rename_all = "snake_case")]
pub enum WalletStatus {
    /// Initial identity lookup has not resolved yet.
    Loading,
    Disconnected,
    Connected(String),
}

pub struct WalletSession {
    gateway: Arc<dyn WalletGateway>,
    status: watch::Sender<WalletStatus>,
}

impl WalletSession {
    pub fn new(gateway: Arc<dyn WalletGateway>) -> Self {
        let (status, _) = watch::channel(WalletStatus::Loading);
        Self { gateway, status }
    }

    /// Ask the wallet for an existing identity.
    ///
    /// Lookup failures are logged and treated as "no wallet".
    pub async fn refresh(&self) {
        let next = match self.gateway.identity().await {
            Ok(Some(address)) => {
                info!("Wallet already connected: {address}");
                WalletStatus::Connected(address)
            }
            Ok(None) => WalletStatus::Disconnected,
            Err(e) => {
                warn!("Wallet identity lookup failed: {e}");
                WalletStatus::Disconnected
            }
        };
        self.status.send_replace(next);
    }

    /// Run the interactive connect flow.
    ///
    /// Returns the new identity, or `None` if the user declined. A declined
    /// prompt or a transport failure leaves the current identity untouched.
    pub async fn connect(&self) -> Result<Option<String>, GatewayError> {
        match self.gateway.connect().await? {
            Some(address) => {
                info!("Wallet connected: {address}");
                self.status
                    .send_replace(WalletStatus::Connected(address.clone()));
                Ok(Some(address))
            }
            None => {
                info!("Wallet connection declined by user");
                Ok(None)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.status.borrow(), WalletStatus::Connected(_))
    }

    pub fn identity(&self) -> Option<String> {
        match &*self.status.borrow() {
            WalletStatus::Connected(address) => Some(address.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> WalletStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletStatus> {
        self.status.subscribe()
    }
}
