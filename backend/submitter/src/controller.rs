//! Submission workflow state machine.
//!
//! ```text
//!            submit (rejected: no wallet / invalid form)
//!           ┌──────┐
//!           ▼      │
//!         Idle ────┘
//!           │ submit (connected + valid)
//!           ▼
//!       Submitting ──► Success   (terminal)
//!           │
//!           ▼
//!         Error ──► Idle         (try_again)
//! ```
//!
//! The state lives in a [`watch`] channel. Every transition is a single
//! check-and-set on that channel, which is what guarantees at most one
//! create-pool call in flight: a `submit` that does not find the state in
//! `Idle` is ignored.
//!
//! The in-flight call is bounded by a timeout and a cancellation token.
//! Both resolve the submission to `Error` so the user can try again.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classifier::{classify, classify_message, SubmissionError};
use crate::form::{CreatePoolRequest, Field, FormData};
use crate::gateway::{ContractGateway, GatewayError};
use crate::validator::{parse_duration_days, validate, ValidationError};
use crate::wallet::WalletSession;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const WALLET_REQUIRED_MESSAGE: &str = "Please connect your wallet first";
pub const TIMEOUT_MESSAGE: &str = "Transaction timed out. Please try again.";
pub const CANCELLED_MESSAGE: &str = "Submission was cancelled.";

/// Source of the current unix time.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub tx_hash: String,
    pub pool_id: Option<u64>,
}

/// Inline message left on `Idle` by a rejected attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub message: String,
}

/// Why `submit` refused to start a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    WalletNotConnected,
    Invalid(ValidationError),
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::WalletNotConnected => WALLET_REQUIRED_MESSAGE,
            Self::Invalid(e) => e.message,
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            Self::WalletNotConnected => None,
            Self::Invalid(e) => Some(e.field),
        }
    }
}

impl From<&Rejection> for Notice {
    fn from(r: &Rejection) -> Self {
        Self {
            field: r.field(),
            message: r.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle { notice: Option<Notice> },
    Submitting,
    Success { result: SubmissionResult },
    Error { error: SubmissionError },
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::Idle { notice: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle { .. } => Phase::Idle,
            Self::Submitting => Phase::Submitting,
            Self::Success { .. } => Phase::Success,
            Self::Error { .. } => Phase::Error,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Idle { notice } => notice.as_ref(),
            _ => None,
        }
    }
}

/// What a single `submit` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not in `Idle` (already submitting, finished, or awaiting try-again).
    Ignored,
    Rejected(Rejection),
    Succeeded(SubmissionResult),
    Failed(SubmissionError),
}

pub struct SubmissionController {
    wallet: Arc<WalletSession>,
    contract: Arc<dyn ContractGateway>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    shutdown: CancellationToken,
    in_flight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<SubmissionState>,
}

impl SubmissionController {
    pub fn new(
        wallet: Arc<WalletSession>,
        contract: Arc<dyn ContractGateway>,
        timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self {
            wallet,
            contract,
            clock: Arc::new(SystemClock),
            timeout,
            shutdown: CancellationToken::new(),
            in_flight: Mutex::new(None),
            state,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// In-flight calls are cancelled when `shutdown` is.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Form inputs must be read-only while a submission is in flight.
    pub fn inputs_disabled(&self) -> bool {
        matches!(*self.state.borrow(), SubmissionState::Submitting)
    }

    pub fn explorer_url(&self, tx_hash: &str) -> String {
        self.contract.explorer_url(tx_hash)
    }

    /// Gate, validate and submit a snapshot of `form`.
    pub async fn submit(&self, form: &FormData) -> SubmitOutcome {
        let snapshot = form.clone();
        let admission = self.admit(&snapshot);
        let token = self.shutdown.child_token();

        let mut outcome = None;
        self.state.send_if_modified(|state| {
            if state.phase() != Phase::Idle {
                outcome = Some(SubmitOutcome::Ignored);
                return false;
            }
            match &admission {
                Err(rejection) => {
                    *state = SubmissionState::Idle {
                        notice: Some(Notice::from(rejection)),
                    };
                    outcome = Some(SubmitOutcome::Rejected(rejection.clone()));
                }
                Ok(_) => {
                    *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(token.clone());
                    *state = SubmissionState::Submitting;
                }
            }
            true
        });

        if let Some(outcome) = outcome {
            match &outcome {
                SubmitOutcome::Ignored => debug!("Submit ignored: controller not idle"),
                SubmitOutcome::Rejected(r) => warn!(
                    "Submit rejected ({}): {}",
                    r.field().map_or("wallet", |f| f.as_str()),
                    r.message()
                ),
                _ => {}
            }
            return outcome;
        }

        let Ok(deadline) = admission else {
            return SubmitOutcome::Ignored;
        };
        let request = CreatePoolRequest::from_form(&snapshot, deadline);
        self.run(request, token).await
    }

    /// Leave `Error` for `Idle`. Returns `false` in any other state.
    pub fn try_again(&self) -> bool {
        let reset = self.state.send_if_modified(|state| {
            if state.phase() == Phase::Error {
                *state = SubmissionState::default();
                true
            } else {
                false
            }
        });
        if reset {
            info!("Submission error dismissed; back to idle");
        }
        reset
    }

    /// Cancel the in-flight create-pool call, if any.
    pub fn cancel(&self) -> bool {
        match &*self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Wallet and form gates. On success returns the pool deadline.
    fn admit(&self, form: &FormData) -> Result<u64, Rejection> {
        if !self.wallet.is_connected() {
            return Err(Rejection::WalletNotConnected);
        }
        validate(form).map_err(Rejection::Invalid)?;
        debug!(
            "Admitting create-pool request from {}",
            self.wallet.identity().unwrap_or_default()
        );
        let days = parse_duration_days(&form.duration_days).unwrap_or_default();
        Ok(self
            .clock
            .now_unix()
            .saturating_add(u64::from(days) * SECONDS_PER_DAY))
    }

    async fn run(&self, request: CreatePoolRequest, token: CancellationToken) -> SubmitOutcome {
        let guard = InFlight {
            state: &self.state,
            in_flight: &self.in_flight,
            done: false,
        };

        info!(
            "Submitting create-pool request \"{}\" (target {}, deadline {})",
            request.name, request.target_amount, request.deadline
        );

        let result = tokio::select! {
            r = tokio::time::timeout(self.timeout, self.contract.create_pool(&request)) => {
                r.unwrap_or_else(|_| Err(GatewayError::new(TIMEOUT_MESSAGE)))
            }
            _ = token.cancelled() => Err(GatewayError::new(CANCELLED_MESSAGE)),
        };

        match result {
            Ok(response) => {
                info!(
                    "Pool created: tx {} (pool id {:?})",
                    response.tx_hash, response.pool_id
                );
                let result = SubmissionResult {
                    tx_hash: response.tx_hash,
                    pool_id: response.pool_id,
                };
                guard.finish(SubmissionState::Success {
                    result: result.clone(),
                });
                SubmitOutcome::Succeeded(result)
            }
            Err(e) => {
                let classified = classify(&e);
                error!(
                    "Create-pool failed ({}): {}",
                    classified.kind.as_str(),
                    e.message
                );
                guard.finish(SubmissionState::Error {
                    error: classified.clone(),
                });
                SubmitOutcome::Failed(classified)
            }
        }
    }
}

/// Leaves `Submitting` even if the submitting future is dropped mid-call.
struct InFlight<'a> {
    state: &'a watch::Sender<SubmissionState>,
    in_flight: &'a Mutex<Option<CancellationToken>>,
    done: bool,
}

impl InFlight<'_> {
    fn finish(mut self, next: SubmissionState) {
        self.state.send_replace(next);
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if !self.done {
            warn!("Submission dropped while in flight");
            self.state.send_replace(SubmissionState::Error {
                error: classify_message(CANCELLED_MESSAGE),
            });
        }
    }
}
