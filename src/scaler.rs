//! Feature standardization.
//!
//! A [`StandardScaler`] is fit once, on the training partition only, and is
//! immutable afterwards. The same parameters standardize training rows,
//! holdout rows and inference requests.

use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-feature mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and population standard deviation.
    ///
    /// Zero-variance columns get a scale of 1.0.
    pub fn fit(x: &Array2<f64>, feature_names: &[&str]) -> Result<Self> {
        ensure!(x.nrows() > 0, "Cannot fit scaler on an empty matrix");
        ensure!(
            x.ncols() == feature_names.len(),
            "Matrix has {} columns but {} feature names were given",
            x.ncols(),
            feature_names.len()
        );
        ensure!(
            x.iter().all(|v| v.is_finite()),
            "Cannot fit scaler on missing or non-finite values"
        );

        let n = x.nrows() as f64;
        let mean: Vec<f64> = x.mean_axis(Axis(0)).context("empty matrix")?.to_vec();
        let scale = x
            .columns()
            .into_iter()
            .zip(&mean)
            .map(|(column, m)| {
                let std = (column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt();
                if std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            mean,
            scale,
        })
    }

    /// Standardize `x` with the stored parameters.
    ///
    /// Fails on a column-count mismatch or any missing (non-finite) value.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        ensure!(
            x.ncols() == self.mean.len(),
            "Expected {} feature columns, got {}",
            self.mean.len(),
            x.ncols()
        );
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            bail!(
                "Missing or non-finite value for feature {} at row {}",
                self.feature_names[col],
                row
            );
        }

        let mut out = x.to_owned();
        for (mut column, (m, s)) in out
            .columns_mut()
            .into_iter()
            .zip(self.mean.iter().zip(&self.scale))
        {
            column.mapv_inplace(|v| (v - m) / s);
        }
        Ok(out)
    }

    /// Standardize one record given as (feature name, value) pairs.
    ///
    /// Every fitted feature must appear exactly once; unknown names fail.
    pub fn transform_named(&self, values: &[(&str, f64)]) -> Result<Array2<f64>> {
        let mut row = vec![None; self.feature_names.len()];
        for (name, value) in values {
            let idx = self
                .feature_names
                .iter()
                .position(|f| f == name)
                .with_context(|| format!("Unknown feature {name}"))?;
            ensure!(row[idx].is_none(), "Feature {name} given more than once");
            row[idx] = Some(*value);
        }

        let row = row
            .into_iter()
            .zip(&self.feature_names)
            .map(|(v, name)| v.with_context(|| format!("Missing feature {name}")))
            .collect::<Result<Vec<f64>>>()?;

        let x = Array2::from_shape_vec((1, row.len()), row)?;
        self.transform(&x)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Load a persisted scaler.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read scaler {}", path.display()))?;
        let scaler: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse scaler {}", path.display()))?;
        ensure!(
            scaler.mean.len() == scaler.scale.len()
                && scaler.mean.len() == scaler.feature_names.len(),
            "Scaler {} is inconsistent",
            path.display()
        );
        Ok(scaler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const NAMES: [&str; 3] = ["a", "b", "c"];

    fn train() -> Array2<f64> {
        array![[1.0, 10.0, 5.0], [2.0, 20.0, 5.0], [3.0, 30.0, 5.0], [6.0, 60.0, 5.0]]
    }

    #[test]
    fn test_transform_of_fit_rows_is_standardized() {
        let x = train();
        let scaler = StandardScaler::fit(&x, &NAMES).unwrap();
        let z = scaler.transform(&x).unwrap();

        for j in 0..2 {
            let column = z.column(j);
            let mean = column.sum() / column.len() as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
        // constant column maps to zero
        assert!(z.column(2).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_does_not_mutate_state() {
        let scaler = StandardScaler::fit(&train(), &NAMES).unwrap();
        let before = scaler.clone();
        scaler.transform(&array![[100.0, 0.0, 1.0]]).unwrap();
        assert_eq!(scaler, before);
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&train(), &NAMES).unwrap();
        assert!(scaler.transform(&array![[1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_transform_rejects_missing_values() {
        let scaler = StandardScaler::fit(&train(), &NAMES).unwrap();
        let err = scaler.transform(&array![[1.0, f64::NAN, 2.0]]).unwrap_err();
        assert!(err.to_string().contains("b"));
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(StandardScaler::fit(&Array2::zeros((0, 3)), &NAMES).is_err());
        assert!(StandardScaler::fit(&train(), &["a", "b"]).is_err());
    }

    #[test]
    fn test_transform_named() {
        let scaler = StandardScaler::fit(&train(), &NAMES).unwrap();
        let named = scaler
            .transform_named(&[("c", 5.0), ("a", 3.0), ("b", 30.0)])
            .unwrap();
        let positional = scaler.transform(&array![[3.0, 30.0, 5.0]]).unwrap();
        assert_eq!(named, positional);

        assert!(scaler.transform_named(&[("a", 1.0), ("b", 2.0)]).is_err());
        assert!(scaler
            .transform_named(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)])
            .is_err());
        assert!(scaler
            .transform_named(&[("a", 1.0), ("a", 2.0), ("c", 3.0)])
            .is_err());
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        let scaler = StandardScaler::fit(&train(), &NAMES).unwrap();
        std::fs::write(&path, scaler.to_bytes().unwrap()).unwrap();

        assert_eq!(StandardScaler::load(&path).unwrap(), scaler);
        assert!(StandardScaler::load(dir.path().join("missing.json")).is_err());
    }
}
