//! Offline Pipeline Trainer
//!
//! Loads the cleaned encounter CSV, fits the column transformer and the
//! class-balanced logistic regression on a stratified 80/20 split, reports
//! held-out metrics and writes the pipeline artifact.

use anyhow::Result;
use clap::Parser;
use readmission_risk::config::{AppConfig, DEFAULT_CONFIG_PATH};
use readmission_risk::logging::init_tracing;
use readmission_risk::training;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "Train the readmission risk pipeline")]
struct Args {
    /// Configuration file
    #[arg(long, env = "READMIT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the cleaned dataset path
    #[arg(long)]
    data: Option<PathBuf>,

    /// Override the artifact output path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of largest coefficients to print
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_from_path(&args.config)?;
    if let Some(data) = args.data {
        config.training.data_path = data;
    }
    let output = args.output.unwrap_or_else(|| config.model.artifact_path.clone());

    init_tracing(&config.logging)?;

    info!(
        data = %config.training.data_path.display(),
        target = %config.training.target_column,
        test_size = config.training.test_size,
        seed = config.training.seed,
        "Starting model training"
    );

    let outcome = training::run(&config.training, &output)?;

    println!("\nModel Evaluation Report:\n");
    println!("{}", outcome.report);
    match outcome.roc_auc {
        Some(auc) => println!("ROC-AUC Score: {:.3}", auc),
        None => println!("ROC-AUC Score: undefined (held-out rows contain one class)"),
    }

    if args.top > 0 {
        println!("\nLargest coefficients:");
        for (name, weight) in outcome.pipeline.top_coefficients(args.top) {
            println!("  {:>+9.4}  {}", weight, name);
        }
    }

    println!("\nModel saved successfully -> {}", output.display());
    Ok(())
}
