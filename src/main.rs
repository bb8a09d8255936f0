//! Readmission Risk Server - Main Entry Point
//!
//! Loads the fitted pipeline once, then serves the patient form and the
//! prediction API until interrupted.

use anyhow::Result;
use clap::Parser;
use readmission_risk::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging::init_tracing,
    metrics::{MetricsReporter, ServingMetrics},
    predictor::RiskPredictor,
    web::{self, AppState},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "Diabetic 30-day readmission risk server")]
struct Args {
    /// Configuration file
    #[arg(long, env = "READMIT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the pipeline artifact path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_from_path(&args.config)?;
    if let Some(model) = args.model {
        config.model.artifact_path = model;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging)?;

    info!("Starting Readmission Risk Server");
    info!(
        config = %args.config.display(),
        artifact = %config.model.artifact_path.display(),
        medium = config.risk.medium,
        high = config.risk.high,
        "Configuration loaded"
    );

    let predictor = Arc::new(RiskPredictor::from_config(&config)?);
    let metrics = Arc::new(ServingMetrics::new());

    let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
    tokio::spawn(reporter.start());

    web::serve(&config.server, AppState::new(predictor, metrics.clone())).await?;

    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}
