//! Batch steps behind the `prepare` and `train` commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::{AppConfig, DataConfig};
use crate::data::{summarize, DataPreparer, DatasetSummary};
use crate::models::registry::ArtifactStore;
use crate::models::tracking::ExperimentTracker;
use crate::models::trainer::{ModelTrainer, TrainingOutcome};
use crate::types::RawRecord;

/// What a preparation run produced
#[derive(Debug)]
pub struct PreparationReport {
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub summary: DatasetSummary,
    pub summary_path: PathBuf,
}

/// Download the raw dataset, then clean and summarize it.
pub async fn run_preparation(config: &AppConfig) -> Result<PreparationReport> {
    let preparer = DataPreparer::new(config.data.clone());
    let raw = preparer.download().await?;
    prepare_from_raw(&config.data, &raw)
}

/// Clean already-fetched raw records, write the cleaned snapshot and the
/// dataset summary.
pub fn prepare_from_raw(config: &DataConfig, raw: &[RawRecord]) -> Result<PreparationReport> {
    let preparer = DataPreparer::new(config.clone());
    let records = preparer.clean(raw)?;

    let summary = summarize(&records);
    let summary_path = summary.write_to(&config.reports_dir)?;
    info!(path = %summary_path.display(), "Dataset summary written");

    Ok(PreparationReport {
        raw_rows: raw.len(),
        clean_rows: records.len(),
        summary,
        summary_path,
    })
}

/// Train both candidates on the cleaned snapshot, commit the artifacts and
/// record the runs. Nothing is persisted unless training succeeded.
pub fn run_training(config: &AppConfig) -> Result<TrainingOutcome> {
    let records = DataPreparer::new(config.data.clone())
        .load_clean()
        .context("Cleaned dataset unavailable, run `prepare` first")?;
    info!(rows = records.len(), "Loaded cleaned dataset");

    let outcome = ModelTrainer::new(config.training.clone()).train(&records)?;

    ArtifactStore::new(&config.models.models_dir).commit(&outcome)?;
    ExperimentTracker::new(&config.tracking.tracking_dir, &config.tracking.experiment_name)
        .log_outcome(&outcome)?;

    info!(
        best_model = %outcome.best,
        train_rows = outcome.train_rows,
        test_rows = outcome.test_rows,
        "Training complete"
    );
    Ok(outcome)
}
