//! Maps raw gateway failures onto a small set of actionable categories.
//!
//! Matching is a case-sensitive substring search on the error message, so it
//! depends on the exact wording used by the wallet and RPC layers. The
//! function is total: anything unrecognised falls through to
//! [`ErrorKind::Unknown`] with a non-empty message.

use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;

pub const FALLBACK_MESSAGE: &str = "Failed to create pool. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UserRejected,
    SimulationFailure,
    TransactionFailure,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRejected => "user_rejected",
            Self::SimulationFailure => "simulation_failure",
            Self::TransactionFailure => "transaction_failure",
            Self::Unknown => "unknown",
        }
    }
}

/// Classified failure of a submission, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionError {
    pub kind: ErrorKind,
    pub message: String,
}

pub fn classify(error: &GatewayError) -> SubmissionError {
    classify_message(&error.message)
}

pub fn classify_message(raw: &str) -> SubmissionError {
    let (kind, message) = if raw.contains("User rejected") {
        (
            ErrorKind::UserRejected,
            "Transaction was rejected. Please try again.".to_string(),
        )
    } else if raw.contains("Simulation failed") {
        (
            ErrorKind::SimulationFailure,
            "Transaction simulation failed. Please check your inputs.".to_string(),
        )
    } else if raw.contains("Transaction failed") {
        (ErrorKind::TransactionFailure, format!("Transaction failed: {raw}"))
    } else if raw.is_empty() {
        (ErrorKind::Unknown, FALLBACK_MESSAGE.to_string())
    } else {
        (ErrorKind::Unknown, raw.to_string())
    };
    SubmissionError { kind, message }
}
