//! Readmission risk predictor: reconcile, score and tier a patient record

use crate::config::AppConfig;
use crate::pipeline::{ExpectedFeatureSet, InferencePipeline, PipelineError, PipelineLoader};
use crate::reconcile::reconcile_with_report;
use crate::types::prediction::{PredictionResult, RiskTierThresholds};
use crate::types::record::PatientRecord;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Scoring outcome plus the features that had to be backfilled
#[derive(Debug, Clone)]
pub struct Scored {
    pub result: PredictionResult,
    pub backfilled: Vec<String>,
}

/// Scoring service wrapping one loaded pipeline.
///
/// Built once by the process entry point and shared read-only with every
/// request handler.
pub struct RiskPredictor {
    pipeline: Arc<dyn InferencePipeline>,
    thresholds: RiskTierThresholds,
}

impl RiskPredictor {
    pub fn new(pipeline: Arc<dyn InferencePipeline>, thresholds: RiskTierThresholds) -> Self {
        Self {
            pipeline,
            thresholds,
        }
    }

    /// Load the configured pipeline artifact. Failure here is fatal to the server.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let pipeline = PipelineLoader::load(&config.model.artifact_path)?;
        let predictor = Self::new(Arc::new(pipeline), config.risk);

        info!(
            features = predictor.expected_features().len(),
            medium = predictor.thresholds.medium,
            high = predictor.thresholds.high,
            "Risk predictor initialized"
        );

        Ok(predictor)
    }

    pub fn expected_features(&self) -> &ExpectedFeatureSet {
        self.pipeline.expected_features()
    }

    pub fn thresholds(&self) -> &RiskTierThresholds {
        &self.thresholds
    }

    /// Score one record
    pub fn predict(&self, record: PatientRecord) -> Result<PredictionResult, PipelineError> {
        self.score(record).map(|scored| scored.result)
    }

    /// Score one record, reporting which expected features were backfilled
    pub fn score(&self, record: PatientRecord) -> Result<Scored, PipelineError> {
        let (record, backfilled) = reconcile_with_report(record, self.expected_features());
        let probability = first(self.pipeline.predict_proba(&[record])?)?;
        let predicted_label = self.pipeline.label_for(probability);

        let result = PredictionResult::new(probability, predicted_label, &self.thresholds);

        debug!(
            request_id = %result.request_id,
            probability = result.probability,
            predicted_label = result.predicted_label,
            risk_tier = %result.risk_tier,
            backfilled = backfilled.len(),
            "Prediction complete"
        );

        Ok(Scored { result, backfilled })
    }
}

fn first<T>(values: Vec<T>) -> Result<T, PipelineError> {
    values.into_iter().next().ok_or(PipelineError::LabelCount { rows: 1, labels: 0 })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::collector::PatientForm;
    use crate::pipeline::FeatureLookup;
    use crate::presenter::format_probability;
    use crate::types::prediction::RiskTier;
    use crate::types::record::{EncounterFields, FeatureValue};
    use std::sync::Mutex;

    /// Pipeline returning a fixed probability; refuses records missing any expected feature
    pub(crate) struct FixedPipeline {
        pub expected: ExpectedFeatureSet,
        pub probability: f64,
        pub seen: Mutex<Vec<PatientRecord>>,
    }

    impl FixedPipeline {
        pub(crate) fn new(probability: f64) -> Self {
            let mut names: Vec<String> =
                EncounterFields::NAMES.iter().map(|s| s.to_string()).collect();
            names.extend(["metformin", "glipizide-metformin", "A1Cresult"].map(String::from));
            Self {
                expected: ExpectedFeatureSet::new(names).unwrap(),
                probability,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl InferencePipeline for FixedPipeline {
        fn expected_features(&self) -> &ExpectedFeatureSet {
            &self.expected
        }

        fn predict_proba(&self, batch: &[PatientRecord]) -> Result<Vec<f64>, PipelineError> {
            for record in batch {
                for name in self.expected.iter() {
                    record.feature(name)?;
                }
            }
            self.seen.lock().unwrap().extend(batch.iter().cloned());
            Ok(vec![self.probability; batch.len()])
        }
    }

    #[test]
    fn test_end_to_end_with_fixed_pipeline() {
        let pipeline = Arc::new(FixedPipeline::new(0.62));
        let predictor = RiskPredictor::new(pipeline.clone(), RiskTierThresholds::default());

        let record = PatientForm::default().collect().unwrap();
        let scored = predictor.score(record).unwrap();

        assert_eq!(scored.result.risk_tier, RiskTier::High);
        assert_eq!(scored.result.predicted_label, 1);
        assert_eq!(format_probability(scored.result.probability), "62.00%");
        assert_eq!(scored.backfilled, vec!["metformin", "glipizide-metformin", "A1Cresult"]);

        // Scored once per request
        let seen = pipeline.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("diag_1"), Some(FeatureValue::category("250")));
        assert_eq!(seen[0].get("glipizide-metformin"), Some(FeatureValue::category("No")));
        assert_eq!(seen[0].get("A1Cresult"), Some(FeatureValue::Integer(0)));
    }

    #[test]
    fn test_predictor_uses_configured_thresholds() {
        let pipeline = Arc::new(FixedPipeline::new(0.4));
        let strict = RiskPredictor::new(
            pipeline.clone(),
            RiskTierThresholds {
                medium: 0.1,
                high: 0.35,
            },
        );
        let standard = RiskPredictor::new(pipeline, RiskTierThresholds::default());

        let record = PatientForm::default().collect().unwrap();
        assert_eq!(strict.predict(record.clone()).unwrap().risk_tier, RiskTier::High);
        assert_eq!(standard.predict(record).unwrap().risk_tier, RiskTier::Medium);
    }

    #[test]
    fn test_low_probability_is_label_zero() {
        let predictor = RiskPredictor::new(
            Arc::new(FixedPipeline::new(0.1)),
            RiskTierThresholds::default(),
        );
        let result = predictor.predict(PatientForm::default().collect().unwrap()).unwrap();
        assert_eq!(result.predicted_label, 0);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(format_probability(result.probability), "10.00%");
    }
}
