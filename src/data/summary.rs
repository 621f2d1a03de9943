//! Descriptive statistics over the cleaned dataset

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::record::{Record, FEATURE_NAMES};

/// File name of the summary report inside the reports directory
pub const SUMMARY_FILE: &str = "dataset_summary.json";

/// Class balance and per-feature statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub positive: usize,
    pub negative: usize,
    pub features: Vec<FeatureSummary>,
}

/// Statistics for one feature column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub name: String,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Pearson correlation with the label (0 when either side is constant)
    pub target_correlation: f64,
}

/// Summarize `records`.
pub fn summarize(records: &[Record]) -> DatasetSummary {
    let labels: Vec<f64> = records.iter().map(|r| f64::from(r.target)).collect();
    let positive = records.iter().filter(|r| r.target == 1).count();

    let features = FEATURE_NAMES
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let column: Vec<f64> = records.iter().map(|r| r.features()[j]).collect();
            let (mean, std) = mean_std(&column);
            FeatureSummary {
                name: name.to_string(),
                mean,
                std,
                min: column.iter().copied().fold(f64::INFINITY, f64::min),
                max: column.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                target_correlation: pearson(&column, &labels),
            }
        })
        .collect();

    DatasetSummary {
        rows: records.len(),
        positive,
        negative: records.len() - positive,
        features,
    }
}

impl DatasetSummary {
    /// Write the summary as pretty JSON into `reports_dir`.
    pub fn write_to(&self, reports_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(reports_dir)
            .with_context(|| format!("Failed to create {}", reports_dir.display()))?;
        let path = reports_dir.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_vec_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, sx) = mean_std(x);
    let (my, sy) = mean_std(y);
    if sx == 0.0 || sy == 0.0 {
        return 0.0;
    }
    let cov = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mx) * (b - my))
        .sum::<f64>()
        / x.len() as f64;
    cov / (sx * sy)
}
