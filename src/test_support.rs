//! Shared fixtures for unit tests

use crate::types::{PatientFeatures, Record};

/// Records where roughly a third are sick and the sick ones differ
/// clearly on cp, thalach, exang, oldpeak, ca and thal.
pub fn synthetic_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let sick = i % 3 == 0;
            let wobble = ((i * 37) % 17) as f64;
            Record {
                age: if sick { 60.0 } else { 45.0 } + wobble,
                sex: (i % 2) as f64,
                cp: if sick { 3.0 } else { 1.0 },
                trestbps: 120.0 + wobble * 2.0,
                chol: 200.0 + wobble * 3.0,
                fbs: ((i / 2) % 2) as f64,
                restecg: (i % 3) as f64,
                thalach: if sick { 130.0 } else { 165.0 } - wobble,
                exang: if sick { 1.0 } else { 0.0 },
                oldpeak: if sick { 2.0 } else { 0.5 } + wobble / 17.0,
                slope: (i % 3) as f64,
                ca: if sick { 2.0 } else { 0.0 },
                thal: if sick { 3.0 } else { 2.0 },
                target: u8::from(sick),
            }
        })
        .collect()
}

/// The first row of the Cleveland dataset as a request
pub fn sample_patient() -> PatientFeatures {
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
