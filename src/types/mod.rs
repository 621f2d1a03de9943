//! Type definitions for the heart disease pipeline

pub mod patient;
pub mod prediction;
pub mod record;

pub use patient::PatientFeatures;
pub use prediction::{Prediction, PredictionResponse, RiskLevel};
pub use record::{RawRecord, Record, FEATURE_COUNT, FEATURE_NAMES};
