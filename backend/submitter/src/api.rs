//! Axum REST API that lets a UI drive the submission controller.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::controller::{SubmissionController, SubmissionState, SubmitOutcome};
use crate::form::FormData;
use crate::wallet::{WalletSession, WalletStatus};

#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<SubmissionController>,
    pub wallet: Arc<WalletSession>,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    #[serde(flatten)]
    pub state: SubmissionState,
    pub inputs_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl SubmissionView {
    fn of(controller: &SubmissionController) -> Self {
        let state = controller.state();
        let explorer_url = match &state {
            SubmissionState::Success { result } => Some(controller.explorer_url(&result.tx_hash)),
            _ => None,
        };
        Self {
            inputs_disabled: matches!(state, SubmissionState::Submitting),
            state,
            explorer_url,
        }
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/wallet", get(get_wallet))
        .route("/wallet/connect", post(connect_wallet))
        .route("/submission", get(get_submission).post(submit))
        .route("/submission/retry", post(try_again))
        .route("/submission/cancel", post(cancel))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /wallet`
pub async fn get_wallet(State(state): State<Arc<ApiState>>) -> Json<WalletStatus> {
    Json(state.wallet.status())
}

/// `POST /wallet/connect`
///
/// Opens the wallet's connect prompt and returns the resulting status.
/// A declined prompt is not an error.
pub async fn connect_wallet(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.wallet.connect().await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!(state.wallet.status()))).into_response(),
        Err(e) => {
            error!("Wallet connect failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!(ErrorResponse {
                    error: e.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// `GET /submission`
pub async fn get_submission(State(state): State<Arc<ApiState>>) -> Json<SubmissionView> {
    Json(SubmissionView::of(&state.controller))
}

/// `POST /submission`
///
/// Runs a full submission. The work is spawned so a client that hangs up
/// does not abort the in-flight transaction.
pub async fn submit(
    State(state): State<Arc<ApiState>>,
    Json(form): Json<FormData>,
) -> impl IntoResponse {
    let controller = state.controller.clone();
    let outcome = match tokio::spawn(async move { controller.submit(&form).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Submission task failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!(ErrorResponse {
                    error: e.to_string()
                })),
            )
                .into_response();
        }
    };

    let status = match outcome {
        SubmitOutcome::Succeeded(_) | SubmitOutcome::Failed(_) => StatusCode::OK,
        SubmitOutcome::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitOutcome::Ignored => StatusCode::CONFLICT,
    };
    (
        status,
        Json(serde_json::json!(SubmissionView::of(&state.controller))),
    )
        .into_response()
}

/// `POST /submission/retry`
pub async fn try_again(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let status = if state.controller.try_again() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(SubmissionView::of(&state.controller)))
}

/// `POST /submission/cancel`
pub async fn cancel(State(state): State<Arc<ApiState>>) -> StatusCode {
    if state.controller.cancel() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CONFLICT
    }
}
