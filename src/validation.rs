//! Declared input bounds for prediction requests.
//!
//! Every field is checked before the record reaches the scaler or the model,
//! and all violations are reported together.

use serde::Serialize;

use crate::types::patient::PatientFeatures;
use crate::types::record::FEATURE_COUNT;

/// Inclusive range accepted for one input field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBound {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldBound {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Bounds for each feature, in model order.
pub const FIELD_BOUNDS: [FieldBound; FEATURE_COUNT] = [
    FieldBound::new("age", 0.0, 120.0),
    FieldBound::new("sex", 0.0, 1.0),
    FieldBound::new("cp", 0.0, 3.0),
    FieldBound::new("trestbps", 0.0, 300.0),
    FieldBound::new("chol", 0.0, 600.0),
    FieldBound::new("fbs", 0.0, 1.0),
    FieldBound::new("restecg", 0.0, 2.0),
    FieldBound::new("thalach", 0.0, 250.0),
    FieldBound::new("exang", 0.0, 1.0),
    FieldBound::new("oldpeak", 0.0, 10.0),
    FieldBound::new("slope", 0.0, 2.0),
    FieldBound::new("ca", 0.0, 4.0),
    FieldBound::new("thal", 0.0, 3.0),
];

/// A single out-of-range field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub message: String,
}

/// All bound violations found in one request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid input fields: {}", field_list(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

fn field_list(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check every field of `patient` against [`FIELD_BOUNDS`].
pub fn validate(patient: &PatientFeatures) -> Result<(), ValidationErrors> {
    let violations: Vec<FieldViolation> = FIELD_BOUNDS
        .iter()
        .zip(patient.values())
        .filter(|(bound, value)| !bound.contains(*value))
        .map(|(bound, value)| FieldViolation {
            field: bound.field.to_string(),
            value,
            min: bound.min,
            max: bound.max,
            message: format!(
                "{} must be between {} and {}",
                bound.field, bound.min, bound.max
            ),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::FEATURE_NAMES;

    fn sample() -> PatientFeatures {
        PatientFeatures {
            age: 63.0,
            sex: 1,
            cp: 3,
            trestbps: 145.0,
            chol: 233.0,
            fbs: 1,
            restecg: 0,
            thalach: 150.0,
            exang: 0,
            oldpeak: 2.3,
            slope: 0,
            ca: 0,
            thal: 1,
        }
    }

    #[test]
    fn test_valid_sample_passes() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn test_out_of_range_age_names_field() {
        let mut patient = sample();
        patient.age = 150.0;

        let err = validate(&patient).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "age");
        assert_eq!(err.violations[0].value, 150.0);
        assert_eq!(err.violations[0].max, 120.0);
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_reports_every_violation() {
        let mut patient = sample();
        patient.sex = 2;
        patient.cp = -1;
        patient.thal = 7;

        let err = validate(&patient).unwrap_err();
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["sex", "cp", "thal"]);
        assert_eq!(err.to_string(), "invalid input fields: sex, cp, thal");

        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut patient = sample();
        patient.age = 120.0;
        patient.oldpeak = 0.0;
        patient.ca = 4;
        assert!(validate(&patient).is_ok());
    }

    #[test]
    fn test_bounds_follow_feature_order() {
        let fields: Vec<&str> = FIELD_BOUNDS.iter().map(|b| b.field).collect();
        assert_eq!(fields, FEATURE_NAMES.to_vec());
    }
}
