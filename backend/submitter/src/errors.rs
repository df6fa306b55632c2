//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bridge error: {0}")]
    Bridge(String),
}

pub type Result<T> = std::result::Result<T, SubmitterError>;
