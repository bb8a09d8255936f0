//! Inference pipeline: column transformer + logistic regression classifier

pub mod fitted;
pub mod loader;
pub mod logistic;
pub mod table;
pub mod transformer;

pub use fitted::{ArtifactMetadata, FittedPipeline};
pub use loader::PipelineLoader;
pub use logistic::{ClassWeight, LogisticParams, LogisticRegression};
pub use table::{ColumnKind, Table};
pub use transformer::ColumnTransformer;

use crate::types::record::{FeatureValue, PatientRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Errors raised while fitting or running the pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("expected feature set is empty")]
    EmptyFeatureSet,
    #[error("duplicate feature name: {0}")]
    DuplicateFeature(String),
    #[error("input is missing expected feature: {0}")]
    MissingFeature(String),
    #[error("feature {feature} expects a numeric value, got {value:?}")]
    TypeMismatch { feature: String, value: String },
    #[error("row has {actual} values but table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },
    #[error("no such column: {0}")]
    UnknownColumn(String),
    #[error("training data is empty")]
    EmptyTrainingSet,
    #[error("training labels contain a single class")]
    SingleClass,
    #[error("invalid label {0:?} (expected 0 or 1)")]
    InvalidLabel(String),
    #[error("{rows} feature rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Ordered list of feature names a fitted pipeline requires as input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ExpectedFeatureSet {
    names: Vec<String>,
}

impl ExpectedFeatureSet {
    /// Build a feature set; names must be non-empty and unique
    pub fn new<I, S>(names: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(PipelineError::EmptyFeatureSet);
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::DuplicateFeature(name.clone()));
            }
        }
        Ok(Self { names })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl TryFrom<Vec<String>> for ExpectedFeatureSet {
    type Error = PipelineError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<ExpectedFeatureSet> for Vec<String> {
    fn from(set: ExpectedFeatureSet) -> Self {
        set.names
    }
}

/// Source of feature values for the transformer.
///
/// `Err(MissingFeature)` means the column itself is absent; `Ok(None)` means
/// the column exists but the value is missing and should be imputed.
pub trait FeatureLookup {
    fn feature(&self, name: &str) -> Result<Option<FeatureValue>, PipelineError>;
}

impl FeatureLookup for PatientRecord {
    fn feature(&self, name: &str) -> Result<Option<FeatureValue>, PipelineError> {
        self.get(name)
            .map(Some)
            .ok_or_else(|| PipelineError::MissingFeature(name.to_string()))
    }
}

/// A fitted transformation + classification pipeline.
///
/// Implementations are immutable after construction and shared across
/// request handlers.
pub trait InferencePipeline: Send + Sync {
    /// Feature names every input record must carry
    fn expected_features(&self) -> &ExpectedFeatureSet;

    /// Class-1 probability for each record
    fn predict_proba(&self, batch: &[PatientRecord]) -> Result<Vec<f64>, PipelineError>;

    /// Class label implied by a class-1 probability
    fn label_for(&self, probability: f64) -> u8 {
        u8::from(probability >= 0.5)
    }

    /// Class label for each record
    fn predict(&self, batch: &[PatientRecord]) -> Result<Vec<u8>, PipelineError> {
        Ok(self
            .predict_proba(batch)?
            .into_iter()
            .map(|p| self.label_for(p))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_feature_set_rejects_empty_and_duplicates() {
        assert_eq!(
            ExpectedFeatureSet::new(Vec::<String>::new()),
            Err(PipelineError::EmptyFeatureSet)
        );
        assert_eq!(
            ExpectedFeatureSet::new(["age", "race", "age"]),
            Err(PipelineError::DuplicateFeature("age".to_string()))
        );
    }

    #[test]
    fn test_expected_feature_set_preserves_order() {
        let set = ExpectedFeatureSet::new(["race", "age", "metformin"]).unwrap();
        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["race", "age", "metformin"]);
        assert!(set.contains("metformin"));
        assert!(!set.contains("insulin"));
    }

    #[test]
    fn test_expected_feature_set_serde() {
        let set = ExpectedFeatureSet::new(["race", "age"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["race","age"]"#);

        let err = serde_json::from_str::<ExpectedFeatureSet>("[]");
        assert!(err.is_err());
    }
}
