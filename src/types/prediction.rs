//! Prediction result data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    /// Determine risk level from the predicted class
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running the selected model on one record
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class (0 or 1)
    pub class: u8,
    /// Probability of the positive class
    pub positive_probability: f64,
    /// Probability of the predicted class
    pub confidence: f64,
    /// Risk level derived from the class
    pub risk_level: RiskLevel,
}

impl Prediction {
    /// Build a prediction from a class and the positive-class probability.
    pub fn new(class: u8, positive_probability: f64) -> Self {
        let confidence = if class == 1 {
            positive_probability
        } else {
            1.0 - positive_probability
        };
        Self {
            class,
            positive_probability,
            confidence,
            risk_level: RiskLevel::from_class(class),
        }
    }

    /// Convert to the HTTP response body
    pub fn to_response(&self, model_used: &str) -> PredictionResponse {
        PredictionResponse {
            prediction: self.class,
            confidence: self.confidence,
            risk_level: self.risk_level,
            model_used: model_used.to_string(),
        }
    }
}

/// Body returned by `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: u8,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub model_used: String,
}
