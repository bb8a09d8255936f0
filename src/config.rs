//! Configuration management for the readmission risk service and trainer

use crate::pipeline::{ClassWeight, LogisticParams};
use crate::types::prediction::RiskTierThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub risk: RiskTierThresholds,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pipeline artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Serialized pipeline written by the trainer and read by the server
    pub artifact_path: PathBuf,
}

/// Offline training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Cleaned encounter CSV
    pub data_path: PathBuf,
    /// Binary label column (1 = readmitted within 30 days)
    pub target_column: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    pub max_iter: usize,
    pub tolerance: f64,
    /// Inverse regularisation strength
    pub c: f64,
    pub class_weight: ClassWeight,
}

impl TrainingConfig {
    pub fn logistic_params(&self) -> LogisticParams {
        LogisticParams {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            c: self.c,
            class_weight: self.class_weight,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Serving metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic summaries; 0 disables them
    pub report_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from the default file location
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Built-in defaults are overlaid by the file (if it exists) and then by
    /// `READMIT__<SECTION>__<KEY>` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("READMIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        self.risk
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [risk] section: {}", e))?;
        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            anyhow::bail!(
                "training.test_size must lie strictly between 0 and 1 (got {})",
                self.training.test_size
            );
        }
        self.training
            .logistic_params()
            .validate()
            .context("Invalid [training] section")?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            model: ModelConfig {
                artifact_path: PathBuf::from("models/readmit_model.json"),
            },
            risk: RiskTierThresholds::default(),
            training: TrainingConfig {
                data_path: PathBuf::from("data/diabetic_data_clean.csv"),
                target_column: "readmit_30".to_string(),
                test_size: 0.2,
                seed: 42,
                max_iter: 500,
                tolerance: 1e-4,
                c: 1.0,
                class_weight: ClassWeight::Balanced,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig {
                report_interval_secs: 300,
            },
        }
    }
}
