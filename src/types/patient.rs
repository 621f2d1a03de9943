//! Prediction request payload

use serde::{Deserialize, Serialize};

use super::record::FEATURE_COUNT;

/// The 13 clinical features submitted for a single prediction.
///
/// Categorical and flag fields are integers; measurements are floats.
/// Bounds are enforced by [`crate::validation`], not by deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    pub age: f64,
    pub sex: i64,
    pub cp: i64,
    pub trestbps: f64,
    pub chol: f64,
    pub fbs: i64,
    pub restecg: i64,
    pub thalach: f64,
    pub exang: i64,
    pub oldpeak: f64,
    pub slope: i64,
    pub ca: i64,
    pub thal: i64,
}

impl PatientFeatures {
    /// Feature values in model order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex as f64,
            self.cp as f64,
            self.trestbps,
            self.chol,
            self.fbs as f64,
            self.restecg as f64,
            self.thalach,
            self.exang as f64,
            self.oldpeak,
            self.slope as f64,
            self.ca as f64,
            self.thal as f64,
        ]
    }
}
