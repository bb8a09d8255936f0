//! Diabetic 30-Day Readmission Risk
//!
//! Collects encounter details from a form, backfills the features the
//! fitted pipeline expects, scores the record with a logistic regression
//! pipeline and presents a tiered risk verdict. The `training` module builds
//! that pipeline offline from a cleaned encounter CSV.

pub mod collector;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod presenter;
pub mod reconcile;
pub mod training;
pub mod types;
pub mod web;

pub use collector::PatientForm;
pub use config::AppConfig;
pub use pipeline::{FittedPipeline, InferencePipeline, PipelineLoader};
pub use predictor::RiskPredictor;
pub use reconcile::reconcile;
pub use types::{classify_tier, PatientRecord, PredictionResult, RiskTier};
