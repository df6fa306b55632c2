//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{Result, SubmitterError};

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the signing bridge fronting the user's wallet
    pub bridge_url: String,
    /// The pool contract address (Strkey format)
    pub contract_id: String,
    /// Network name used when building explorer links (e.g. `testnet`, `public`)
    pub network: String,
    /// Base URL of the transaction explorer
    pub explorer_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Upper bound (in seconds) on a single in-flight create-pool call
    pub submit_timeout_secs: u64,
    /// Timeout (in seconds) applied to every HTTP request made to the bridge
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            bridge_url: env_var("BRIDGE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8787".to_string()),
            contract_id: env_var("CONTRACT_ID").map_err(|_| {
                SubmitterError::Config("CONTRACT_ID environment variable is required".to_string())
            })?,
            network: env_var("NETWORK").unwrap_or_else(|_| "testnet".to_string()),
            explorer_url: env_var("EXPLORER_URL")
                .unwrap_or_else(|_| "https://stellar.expert/explorer".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3002".to_string())
                .parse()
                .map_err(|_| SubmitterError::Config("Invalid API_PORT".to_string()))?,
            submit_timeout_secs: parse_secs("SUBMIT_TIMEOUT_SECS", "120")?,
            http_timeout_secs: parse_secs("HTTP_TIMEOUT_SECS", "150")?,
        })
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parse a positive number of seconds; zero would make every call time out.
fn parse_secs(key: &str, default: &str) -> Result<u64> {
    let secs: u64 = env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| SubmitterError::Config(format!("Invalid {key}")))?;
    if secs == 0 {
        return Err(SubmitterError::Config(format!("{key} must be greater than 0")));
    }
    Ok(secs)
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| SubmitterError::Config(format!("Missing env var: {key}")))
}
