//! File-based experiment tracking
//!
//! Each candidate of a training run becomes one run record: a standalone
//! `<run_id>.json` plus one line appended to `runs.jsonl` under the
//! experiment directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::models::classifier::ModelKind;
use crate::models::evaluation::EvaluationMetrics;
use crate::models::trainer::{CandidateReport, TrainingOutcome};

const RUNS_LOG: &str = "runs.jsonl";

/// One tracked candidate run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub run_name: String,
    pub experiment: String,
    pub model: ModelKind,
    pub params: serde_json::Value,
    pub cv_mean: f64,
    pub cv_std: f64,
    pub metrics: EvaluationMetrics,
    /// Whether this candidate was selected for serving
    pub selected: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn from_report(experiment: &str, report: &CandidateReport, selected: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_name: report.kind.run_name().to_string(),
            experiment: experiment.to_string(),
            model: report.kind,
            params: report.params.clone(),
            cv_mean: report.cross_validation.mean,
            cv_std: report.cross_validation.std,
            metrics: report.metrics,
            selected,
            started_at: report.started_at,
            finished_at: report.finished_at,
        }
    }
}

pub struct ExperimentTracker {
    experiment: String,
    dir: PathBuf,
}

impl ExperimentTracker {
    /// Tracker writing under `<tracking_dir>/<experiment>`.
    pub fn new<P: AsRef<Path>>(tracking_dir: P, experiment: &str) -> Self {
        Self {
            experiment: experiment.to_string(),
            dir: tracking_dir.as_ref().join(experiment),
        }
    }

    pub fn experiment_dir(&self) -> &Path {
        &self.dir
    }

    /// Record every candidate of a committed training run.
    pub fn log_outcome(&self, outcome: &TrainingOutcome) -> Result<Vec<RunRecord>> {
        outcome
            .candidates
            .iter()
            .map(|c| {
                let record = RunRecord::from_report(
                    &self.experiment,
                    &c.report,
                    c.report.kind == outcome.best,
                );
                self.log_run(&record)?;
                Ok(record)
            })
            .collect()
    }

    pub fn log_run(&self, record: &RunRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let run_path = self.dir.join(format!("{}.json", record.run_id));
        fs::write(&run_path, serde_json::to_vec_pretty(record)?)
            .with_context(|| format!("Failed to write {}", run_path.display()))?;

        let log_path = self.dir.join(RUNS_LOG);
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open {}", log_path.display()))?;
        writeln!(log, "{}", serde_json::to_string(record)?)?;

        info!(
            run_id = %record.run_id,
            run_name = %record.run_name,
            roc_auc = record.metrics.roc_auc,
            "Experiment run recorded"
        );
        Ok(())
    }

    /// All runs recorded so far, oldest first.
    pub fn runs(&self) -> Result<Vec<RunRecord>> {
        let log_path = self.dir.join(RUNS_LOG);
        if !log_path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&log_path)
            .with_context(|| format!("Failed to read {}", log_path.display()))?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Malformed run record"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluation::CrossValidation;

    fn report(kind: ModelKind, roc_auc: f64) -> CandidateReport {
        CandidateReport {
            kind,
            params: serde_json::json!({ "seed": 42 }),
            cross_validation: CrossValidation::from_scores(vec![0.8, 0.9]),
            metrics: EvaluationMetrics {
                accuracy: 0.85,
                precision: 0.8,
                recall: 0.75,
                roc_auc,
            },
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_log_run_appends_and_writes_run_file() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::new(dir.path(), "heart_disease_prediction");

        let first = RunRecord::from_report(
            "heart_disease_prediction",
            &report(ModelKind::LogisticRegression, 0.9),
            true,
        );
        let second = RunRecord::from_report(
            "heart_disease_prediction",
            &report(ModelKind::RandomForest, 0.88),
            false,
        );
        tracker.log_run(&first).unwrap();
        tracker.log_run(&second).unwrap();

        let runs = tracker.runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_name, "Logistic_Regression");
        assert_eq!(runs[1].run_name, "Random_Forest");
        assert!(runs[0].selected);
        assert!((runs[0].cv_mean - 0.85).abs() < 1e-12);

        let run_file = tracker.experiment_dir().join(format!("{}.json", first.run_id));
        assert!(run_file.exists());
    }

    #[test]
    fn test_runs_empty_without_log() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::new(dir.path(), "exp");
        assert!(tracker.runs().unwrap().is_empty());
    }
}
