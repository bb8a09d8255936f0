//! Pipeline artifact loader

use super::fitted::{FittedPipeline, ARTIFACT_FORMAT_VERSION};
use super::InferencePipeline;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// Reads and writes serialized pipeline artifacts
pub struct PipelineLoader;

impl PipelineLoader {
    /// Load a fitted pipeline from a JSON artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FittedPipeline> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading pipeline artifact");

        let file = File::open(path)
            .with_context(|| format!("Failed to open pipeline artifact {:?}", path))?;
        let pipeline: FittedPipeline = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse pipeline artifact {:?}", path))?;

        let metadata = pipeline.metadata();
        if metadata.format_version != ARTIFACT_FORMAT_VERSION {
            warn!(
                found = metadata.format_version,
                supported = ARTIFACT_FORMAT_VERSION,
                "Pipeline artifact format version differs from this build"
            );
        }

        info!(
            features = pipeline.expected_features().len(),
            target = %metadata.target_column,
            trained_at = %metadata.trained_at,
            train_rows = metadata.train_rows,
            roc_auc = ?metadata.roc_auc,
            "Pipeline loaded successfully"
        );

        Ok(pipeline)
    }

    /// Write a fitted pipeline, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(pipeline: &FittedPipeline, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create pipeline artifact {:?}", path))?;
        serde_json::to_writer(BufWriter::new(file), pipeline)
            .with_context(|| format!("Failed to write pipeline artifact {:?}", path))?;

        info!(path = %path.display(), "Pipeline artifact saved");
        Ok(())
    }
}
