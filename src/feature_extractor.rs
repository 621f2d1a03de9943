//! Feature extraction for model training and inference.
//!
//! Turns cleaned records and prediction requests into the 13-column matrices
//! the scaler and classifiers consume. Column order is fixed by
//! [`FEATURE_NAMES`] and is the same at training and serving time.

use ndarray::{Array1, Array2};

use crate::types::patient::PatientFeatures;
use crate::types::record::{Record, FEATURE_COUNT, FEATURE_NAMES};

/// Feature extractor that transforms records into model input features.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature matrix (one row per record).
    pub fn matrix(&self, records: &[Record]) -> Array2<f64> {
        let mut x = Array2::zeros((records.len(), FEATURE_COUNT));
        for (mut row, record) in x.rows_mut().into_iter().zip(records) {
            for (cell, value) in row.iter_mut().zip(record.features()) {
                *cell = value;
            }
        }
        x
    }

    /// Extract the label vector.
    pub fn labels(&self, records: &[Record]) -> Array1<usize> {
        records.iter().map(|r| usize::from(r.target)).collect()
    }

    /// Pair each request value with its feature name, in column order.
    pub fn named(&self, patient: &PatientFeatures) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(patient.values()).collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
