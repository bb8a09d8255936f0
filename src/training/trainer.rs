//! Training run: split, fit, evaluate on held-out rows, persist

use super::dataset::{load_clean_data, split_target};
use super::evaluation::{roc_auc, ClassificationReport};
use super::split::stratified_split;
use crate::config::TrainingConfig;
use crate::pipeline::{FittedPipeline, PipelineLoader, Table};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Fitted pipeline plus its held-out evaluation
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub pipeline: FittedPipeline,
    pub report: ClassificationReport,
    pub roc_auc: Option<f64>,
    /// Rows of the input table used for fitting
    pub train_indices: Vec<usize>,
    /// Rows of the input table used for evaluation
    pub test_indices: Vec<usize>,
}

/// Fit on the training split of `data` and evaluate on the held-out split
pub fn fit_and_evaluate(data: &Table, config: &TrainingConfig) -> Result<TrainingOutcome> {
    let (features, labels) = split_target(data, &config.target_column)
        .with_context(|| format!("Failed to extract target column {:?}", config.target_column))?;

    let split = stratified_split(&labels, config.test_size, config.seed)
        .context("Failed to split training data")?;

    let train = features.select_rows(&split.train);
    let test = features.select_rows(&split.test);
    let train_labels: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
    let test_labels: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();

    info!(
        train_rows = train.n_rows(),
        test_rows = test.n_rows(),
        features = train.n_columns(),
        "Data split complete"
    );

    let mut pipeline = FittedPipeline::fit(
        &train,
        &train_labels,
        &config.target_column,
        &config.logistic_params(),
    )
    .context("Failed to fit pipeline")?;

    let probabilities = pipeline
        .predict_proba_table(&test)
        .context("Failed to score held-out rows")?;
    let predicted: Vec<u8> = probabilities.iter().map(|&p| u8::from(p >= 0.5)).collect();

    let report = ClassificationReport::from_predictions(&test_labels, &predicted);
    let auc = roc_auc(&test_labels, &probabilities);
    pipeline.record_evaluation(test.n_rows(), auc);

    info!(
        accuracy = report.accuracy,
        roc_auc = ?auc,
        "Held-out evaluation complete"
    );

    Ok(TrainingOutcome {
        pipeline,
        report,
        roc_auc: auc,
        train_indices: split.train,
        test_indices: split.test,
    })
}

/// Load the dataset, train, evaluate and write the artifact
pub fn run(config: &TrainingConfig, artifact_path: &Path) -> Result<TrainingOutcome> {
    let data = load_clean_data(&config.data_path)?;
    let outcome = fit_and_evaluate(&data, config)?;
    PipelineLoader::save(&outcome.pipeline, artifact_path)?;
    Ok(outcome)
}
