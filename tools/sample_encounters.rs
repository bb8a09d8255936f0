//! Sample Encounter Generator
//!
//! Writes a synthetic cleaned-encounter CSV with the real dataset's columns,
//! for running the trainer and server without the real data.

use anyhow::Result;
use clap::Parser;
use readmission_risk::training::synthetic::write_csv_file;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "Generate a synthetic encounter dataset")]
struct Args {
    /// Output CSV path
    #[arg(long, default_value = "data/diabetic_data_clean.csv")]
    output: PathBuf,

    /// Number of encounters
    #[arg(long, default_value_t = 5000)]
    rows: usize,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_encounters=info".parse()?),
        )
        .init();

    let args = Args::parse();
    write_csv_file(&args.output, args.rows, args.seed)?;

    info!(
        path = %args.output.display(),
        rows = args.rows,
        seed = args.seed,
        "Synthetic encounters written"
    );
    Ok(())
}
