//! Configuration management for the heart disease pipeline

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

const DEFAULT_SOURCE_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/heart-disease/processed.cleveland.data";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub models: ModelsConfig,
    pub tracking: TrackingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Dataset source and snapshot locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// URL of the raw Cleveland dataset
    pub source_url: String,
    /// Raw snapshot (header row, empty cell for missing values)
    pub raw_path: PathBuf,
    /// Cleaned snapshot read by the trainer
    pub clean_path: PathBuf,
    /// Directory for the dataset summary report
    pub reports_dir: PathBuf,
}

/// Split, cross-validation and hyperparameter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and every stochastic learner
    pub seed: u64,
    /// Number of cross-validation folds
    pub cv_folds: usize,
    pub logistic: LogisticParams,
    pub forest: ForestParams,
}

/// Logistic regression hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticParams {
    /// Inverse regularization strength (the L2 penalty is 1 / c)
    pub c: f64,
    /// Maximum optimizer iterations
    pub max_iterations: u64,
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Features drawn for each tree; the square root of the feature count
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_features: Option<usize>,
}

/// Model artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the scaler, fitted models and best-model token
    pub models_dir: PathBuf,
}

/// Experiment tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Root directory for experiment records
    pub tracking_dir: PathBuf,
    /// Experiment name, used as a subdirectory
    pub experiment_name: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the prediction service binds to
    pub listen_addr: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a specific path.
    ///
    /// Layers, lowest precedence first: built-in defaults, the TOML file
    /// (optional), then `HEART__SECTION__KEY` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to encode default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("HEART").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                source_url: DEFAULT_SOURCE_URL.to_string(),
                raw_path: PathBuf::from("data/heart_disease_raw.csv"),
                clean_path: PathBuf::from("data/heart_disease_clean.csv"),
                reports_dir: PathBuf::from("reports"),
            },
            training: TrainingConfig {
                test_size: 0.2,
                seed: 42,
                cv_folds: 5,
                logistic: LogisticParams {
                    c: 1.0,
                    max_iterations: 1000,
                },
                forest: ForestParams {
                    n_estimators: 100,
                    max_depth: 10,
                    min_samples_split: 5,
                    max_features: None,
                },
            },
            models: ModelsConfig {
                models_dir: PathBuf::from("models"),
            },
            tracking: TrackingConfig {
                tracking_dir: PathBuf::from("mlruns"),
                experiment_name: "heart_disease_prediction".to_string(),
            },
            server: ServerConfig {
                listen_addr: "0.0.0.0:8000".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.cv_folds, 5);
        assert_eq!(config.training.logistic.c, 1.0);
        assert_eq!(config.training.logistic.max_iterations, 1000);
        assert_eq!(config.training.forest.n_estimators, 100);
        assert_eq!(config.training.forest.max_depth, 10);
        assert_eq!(config.training.forest.min_samples_split, 5);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nlisten_addr = \"127.0.0.1:9000\"").unwrap();
        writeln!(file, "[training.forest]\nn_estimators = 10").unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.training.forest.n_estimators, 10);
        assert_eq!(config.training.forest.max_depth, 10);
    }
}
