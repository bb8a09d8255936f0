//! Type definitions for the readmission risk pipeline

pub mod prediction;
pub mod record;

pub use prediction::{classify_tier, PredictionResult, RiskTier, RiskTierThresholds};
pub use record::{EncounterFields, FeatureValue, PatientRecord};
