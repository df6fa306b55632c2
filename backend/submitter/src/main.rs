//! Pool Submission Service — entry point.
//!
//! Restores the wallet session from the signing bridge in the background and
//! exposes a small Axum REST API through which the frontend drives pool
//! creation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use submitter::api::{self, ApiState};
use submitter::config::Config;
use submitter::controller::SubmissionController;
use submitter::rpc::BridgeClient;
use submitter::wallet::WalletSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // One bridge client serves as both wallet and contract gateway.
    let bridge = Arc::new(BridgeClient::new(&config)?);

    // ─── Wallet session ───────────────────────────────────
    let wallet = Arc::new(WalletSession::new(bridge.clone()));
    tokio::spawn({
        let wallet = wallet.clone();
        async move { wallet.refresh().await }
    });

    // ─── Controller ───────────────────────────────────────
    let shutdown = CancellationToken::new();
    let controller = Arc::new(
        SubmissionController::new(wallet.clone(), bridge, config.submit_timeout())
            .with_shutdown(shutdown.clone()),
    );

    // ─── REST API ─────────────────────────────────────────
    let app = api::router(Arc::new(ApiState { controller, wallet }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr} (contract {})", config.contract_id);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            info!("Shutting down; cancelling in-flight submission");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
