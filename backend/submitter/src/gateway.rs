//! Collaborator interfaces consumed by the submission core.
//!
//! [`WalletGateway`] fronts the user's signing wallet and [`ContractGateway`]
//! fronts the pool contract. Both are async traits so the controller can be
//! driven by the JSON-RPC bridge in production and by in-memory mocks in
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::errors::SubmitterError;
use crate::form::CreatePoolRequest;

/// Raw failure surfaced by a collaborator.
///
/// Only `message` is relied upon downstream; `code` and `data` are carried
/// through for logging and for a future structured classifier.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            data: None,
        }
    }
}

impl From<SubmitterError> for GatewayError {
    fn from(e: SubmitterError) -> Self {
        Self::new(e.to_string())
    }
}

/// Successful create-pool outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolResponse {
    pub tx_hash: String,
    #[serde(default)]
    pub pool_id: Option<u64>,
}

#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Public identifier of an already connected wallet, if any.
    async fn identity(&self) -> Result<Option<String>, GatewayError>;

    /// Run the interactive connect flow.
    ///
    /// `Ok(None)` means the user rejected or closed the prompt.
    async fn connect(&self) -> Result<Option<String>, GatewayError>;
}

#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Sign, send and await a create-pool transaction.
    async fn create_pool(
        &self,
        request: &CreatePoolRequest,
    ) -> Result<CreatePoolResponse, GatewayError>;

    /// Human-navigable link for `tx_hash`. Display only.
    fn explorer_url(&self, tx_hash: &str) -> String;
}

/// `{base}/{network}/tx/{tx_hash}`, tolerant of a trailing slash on `base`.
pub fn explorer_tx_url(base: &str, network: &str, tx_hash: &str) -> String {
    format!("{}/{}/tx/{}", base.trim_end_matches('/'), network, tx_hash)
}
