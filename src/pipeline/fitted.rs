//! Fitted pipeline: the persisted transformer + classifier artifact

use super::logistic::{LogisticParams, LogisticRegression};
use super::table::Table;
use super::transformer::ColumnTransformer;
use super::{ExpectedFeatureSet, FeatureLookup, InferencePipeline, PipelineError};
use crate::types::record::PatientRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version of the artifact layout written by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Provenance recorded alongside the fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub target_column: String,
    pub train_rows: usize,
    /// Held-out rows used for evaluation, if any
    pub test_rows: Option<usize>,
    /// ROC-AUC on the held-out rows, if evaluated
    pub roc_auc: Option<f64>,
    pub solver_iterations: usize,
    pub converged: bool,
}

/// Transformer + classifier fitted together on one training table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    metadata: ArtifactMetadata,
    expected_features: ExpectedFeatureSet,
    transformer: ColumnTransformer,
    classifier: LogisticRegression,
}

impl FittedPipeline {
    /// Fit on a feature table (target column already removed) and its labels.
    ///
    /// Every column of the table becomes an expected input feature.
    pub fn fit(
        features: &Table,
        labels: &[u8],
        target_column: &str,
        params: &LogisticParams,
    ) -> Result<Self, PipelineError> {
        if features.n_rows() == 0 {
            return Err(PipelineError::EmptyTrainingSet);
        }
        if features.n_rows() != labels.len() {
            return Err(PipelineError::LabelCount {
                rows: features.n_rows(),
                labels: labels.len(),
            });
        }

        let expected_features = ExpectedFeatureSet::new(features.columns().iter().cloned())?;
        let transformer = ColumnTransformer::fit(features, &expected_features)?;

        info!(
            features = expected_features.len(),
            numeric = transformer.numeric_columns().len(),
            categorical = transformer.categorical_columns().len(),
            encoded_width = transformer.output_width(),
            "Column transformer fitted"
        );

        let encoded = features
            .iter_rows()
            .map(|row| transformer.transform(&row))
            .collect::<Result<Vec<_>, _>>()?;
        let classifier =
            LogisticRegression::fit(&encoded, transformer.output_width(), labels, params)?;

        info!(
            rows = features.n_rows(),
            iterations = classifier.iterations(),
            converged = classifier.converged(),
            "Classifier fitted"
        );

        Ok(Self {
            metadata: ArtifactMetadata {
                format_version: ARTIFACT_FORMAT_VERSION,
                trained_at: Utc::now(),
                target_column: target_column.to_string(),
                train_rows: features.n_rows(),
                test_rows: None,
                roc_auc: None,
                solver_iterations: classifier.iterations(),
                converged: classifier.converged(),
            },
            expected_features,
            transformer,
            classifier,
        })
    }

    /// Record held-out evaluation results in the artifact metadata
    pub fn record_evaluation(&mut self, test_rows: usize, roc_auc: Option<f64>) {
        self.metadata.test_rows = Some(test_rows);
        self.metadata.roc_auc = roc_auc;
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn transformer(&self) -> &ColumnTransformer {
        &self.transformer
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Class-1 probability for any feature source
    pub fn probability<L: FeatureLookup + ?Sized>(&self, row: &L) -> Result<f64, PipelineError> {
        let encoded = self.transformer.transform(row)?;
        Ok(self.classifier.predict_proba(&encoded))
    }

    /// Class-1 probability for every row of a table
    pub fn predict_proba_table(&self, table: &Table) -> Result<Vec<f64>, PipelineError> {
        table.iter_rows().map(|row| self.probability(&row)).collect()
    }

    /// Output features with the largest absolute coefficients
    pub fn top_coefficients(&self, limit: usize) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self
            .transformer
            .output_feature_names()
            .into_iter()
            .zip(self.classifier.coefficients().iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        pairs.truncate(limit);
        pairs
    }
}

impl InferencePipeline for FittedPipeline {
    fn expected_features(&self) -> &ExpectedFeatureSet {
        &self.expected_features
    }

    fn predict_proba(&self, batch: &[PatientRecord]) -> Result<Vec<f64>, PipelineError> {
        batch.iter().map(|record| self.probability(record)).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::record::tests::sample_fields;
    use crate::types::record::FeatureValue;

    /// Small table where insulin "Up" and many inpatient visits mean readmission
    pub(crate) fn toy_training_data() -> (Table, Vec<u8>) {
        let mut table = Table::new(vec![
            "age".to_string(),
            "number_inpatient".to_string(),
            "insulin".to_string(),
            "metformin".to_string(),
        ]);
        let rows = [
            ("[60-70)", "0", "No", "No", 0),
            ("[70-80)", "0", "Steady", "Steady", 0),
            ("[50-60)", "1", "No", "No", 0),
            ("[60-70)", "0", "Down", "No", 0),
            ("[80-90)", "1", "Steady", "", 0),
            ("[40-50)", "0", "No", "Steady", 0),
            ("[70-80)", "4", "Up", "No", 1),
            ("[60-70)", "5", "Up", "No", 1),
            ("[80-90)", "3", "Up", "Steady", 1),
            ("[70-80)", "6", "Steady", "No", 1),
        ];
        let mut labels = Vec::new();
        for (age, inpatient, insulin, metformin, label) in rows {
            table.push_text_row([age, inpatient, insulin, metformin]).unwrap();
            labels.push(label);
        }
        (table, labels)
    }

    #[test]
    fn test_fit_exposes_expected_features() {
        let (table, labels) = toy_training_data();
        let pipeline =
            FittedPipeline::fit(&table, &labels, "readmit_30", &LogisticParams::default()).unwrap();

        let names: Vec<&str> = pipeline.expected_features().iter().collect();
        assert_eq!(names, vec!["age", "number_inpatient", "insulin", "metformin"]);
        assert_eq!(pipeline.metadata().train_rows, 10);
        assert_eq!(pipeline.metadata().format_version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(pipeline.metadata().roc_auc, None);
    }

    #[test]
    fn test_pipeline_scores_records() {
        let (table, labels) = toy_training_data();
        let pipeline =
            FittedPipeline::fit(&table, &labels, "readmit_30", &LogisticParams::default()).unwrap();

        let mut risky_fields = sample_fields();
        risky_fields.number_inpatient = 6;
        risky_fields.insulin = "Up".to_string();
        let risky = PatientRecord::new(risky_fields).with_extra("metformin", FeatureValue::category("No"));

        let mut calm_fields = sample_fields();
        calm_fields.number_inpatient = 0;
        calm_fields.insulin = "No".to_string();
        let calm = PatientRecord::new(calm_fields).with_extra("metformin", FeatureValue::category("No"));

        let probs = pipeline.predict_proba(&[risky.clone(), calm.clone()]).unwrap();
        assert!(probs[0] > probs[1]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));

        let labels = pipeline.predict(&[risky, calm]).unwrap();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn test_pipeline_refuses_unreconciled_record() {
        let (table, labels) = toy_training_data();
        let pipeline =
            FittedPipeline::fit(&table, &labels, "readmit_30", &LogisticParams::default()).unwrap();

        let record = PatientRecord::new(sample_fields());
        assert_eq!(
            pipeline.predict_proba(&[record]),
            Err(PipelineError::MissingFeature("metformin".to_string()))
        );
    }

    #[test]
    fn test_record_evaluation() {
        let (table, labels) = toy_training_data();
        let mut pipeline =
            FittedPipeline::fit(&table, &labels, "readmit_30", &LogisticParams::default()).unwrap();

        pipeline.record_evaluation(3, Some(0.75));
        assert_eq!(pipeline.metadata().test_rows, Some(3));
        assert_eq!(pipeline.metadata().roc_auc, Some(0.75));
        assert_eq!(pipeline.top_coefficients(3).len(), 3);
    }
}
