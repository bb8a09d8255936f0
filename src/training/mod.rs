//! Offline training: dataset loading, stratified split, fitting and evaluation

pub mod dataset;
pub mod evaluation;
pub mod split;
pub mod synthetic;
pub mod trainer;

pub use dataset::{load_clean_data, split_target};
pub use evaluation::{roc_auc, ClassificationReport};
pub use split::{stratified_split, SplitIndices};
pub use trainer::{fit_and_evaluate, run, TrainingOutcome};
