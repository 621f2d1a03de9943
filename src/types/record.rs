//! Patient record data structures for the Cleveland heart disease dataset

use serde::{Deserialize, Serialize};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 13;

/// Feature column names, in the order the models consume them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// A record as it arrives from the source, before cleaning.
///
/// Every column is optional because the source marks unknown values with `?`.
/// The label is the raw multi-level diagnosis (0 = no disease, 1-4 = disease).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub age: Option<f64>,
    pub sex: Option<f64>,
    pub cp: Option<f64>,
    pub trestbps: Option<f64>,
    pub chol: Option<f64>,
    pub fbs: Option<f64>,
    pub restecg: Option<f64>,
    pub thalach: Option<f64>,
    pub exang: Option<f64>,
    pub oldpeak: Option<f64>,
    pub slope: Option<f64>,
    pub ca: Option<f64>,
    pub thal: Option<f64>,
    pub target: Option<f64>,
}

impl RawRecord {
    /// Build a raw record from the 14 source columns in file order.
    pub fn from_columns(columns: [Option<f64>; FEATURE_COUNT + 1]) -> Self {
        let [
            age, sex, cp, trestbps, chol, fbs, restecg, thalach, exang, oldpeak, slope, ca, thal,
            target,
        ] = columns;
        Self {
            age,
            sex,
            cp,
            trestbps,
            chol,
            fbs,
            restecg,
            thalach,
            exang,
            oldpeak,
            slope,
            ca,
            thal,
            target,
        }
    }

    /// Feature columns in model order.
    pub fn features(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// True when every feature and the label are present and finite.
    pub fn is_complete(&self) -> bool {
        self.features()
            .iter()
            .chain(std::iter::once(&self.target))
            .all(|v| v.is_some_and(f64::is_finite))
    }
}

/// A cleaned record: no missing values, binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Age in years
    pub age: f64,
    /// Sex (1 = male, 0 = female)
    pub sex: f64,
    /// Chest pain type
    pub cp: f64,
    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,
    /// Serum cholesterol (mg/dl)
    pub chol: f64,
    /// Fasting blood sugar > 120 mg/dl
    pub fbs: f64,
    /// Resting electrocardiographic result
    pub restecg: f64,
    /// Maximum heart rate achieved
    pub thalach: f64,
    /// Exercise induced angina
    pub exang: f64,
    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,
    /// Slope of the peak exercise ST segment
    pub slope: f64,
    /// Number of major vessels colored by fluoroscopy
    pub ca: f64,
    /// Thalassemia category
    pub thal: f64,
    /// 1 = disease present, 0 = absent
    pub target: u8,
}

impl Record {
    /// Feature values in model order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Clean a raw record. Returns `None` when any column is missing.
    ///
    /// The label collapses to 1 for any positive diagnosis.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        if !raw.is_complete() {
            return None;
        }
        let [age, sex, cp, trestbps, chol, fbs, restecg, thalach, exang, oldpeak, slope, ca, thal] =
            raw.features().map(|v| v.unwrap_or_default());
        let target = u8::from(raw.target.unwrap_or_default() > 0.0);

        Some(Self {
            age,
            sex,
            cp,
            trestbps,
            chol,
            fbs,
            restecg,
            thalach,
            exang,
            oldpeak,
            slope,
            ca,
            thal,
            target,
        })
    }
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        let f = record.features();
        let mut columns = [None; FEATURE_COUNT + 1];
        for (slot, value) in columns.iter_mut().zip(f) {
            *slot = Some(value);
        }
        columns[FEATURE_COUNT] = Some(f64::from(record.target));
        RawRecord::from_columns(columns)
    }
}
