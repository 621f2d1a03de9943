//! Heart Disease Pipeline Library
//!
//! Prepares the Cleveland heart disease dataset, trains and selects a
//! classifier, and serves risk predictions over HTTP.

pub mod api;
pub mod config;
pub mod data;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scaler;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use api::{build_router, AppState, ModelState};
pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use scaler::StandardScaler;
pub use types::{PatientFeatures, Prediction, PredictionResponse, Record};
