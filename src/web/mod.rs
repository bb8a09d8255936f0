//! HTTP surface: the patient form page and the prediction API

pub mod error;
pub mod handlers;
pub mod page;
pub mod router;

pub use error::WebError;
pub use router::build_router;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::metrics::ServingMetrics;
use crate::predictor::RiskPredictor;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<RiskPredictor>,
    pub metrics: Arc<ServingMetrics>,
}

impl AppState {
    pub fn new(predictor: Arc<RiskPredictor>, metrics: Arc<ServingMetrics>) -> Self {
        Self { predictor, metrics }
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    let local = listener
        .local_addr()
        .context("Failed to read bound address")?;

    info!(%local, "Readmission risk server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Readmission risk server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
