//! Candidate classifiers and their persisted form.
//!
//! The learners themselves come from `linfa`: logistic regression from
//! `linfa-logistic` and decision trees from `linfa-trees`, bagged here into a
//! seeded random forest.

use anyhow::{anyhow, bail, ensure, Context, Result};
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::{ForestParams, LogisticParams};

/// The two candidate model kinds, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
}

impl ModelKind {
    /// Evaluation order. Selection ties resolve to the earlier entry.
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::RandomForest];

    /// Identifier used for artifact names and the best-model token
    pub fn identifier(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::RandomForest => "random_forest",
        }
    }

    /// Human readable run name for the experiment log
    pub fn run_name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic_Regression",
            ModelKind::RandomForest => "Random_Forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.identifier() == s.trim())
            .ok_or_else(|| anyhow!("Unknown model identifier {s:?}"))
    }
}

/// Hyperparameters for one training run of every candidate
#[derive(Debug, Clone)]
pub struct Hyperparameters {
    pub logistic: LogisticParams,
    pub forest: ForestParams,
    pub seed: u64,
}

impl Hyperparameters {
    /// Parameters of `kind` as a flat JSON object for the experiment log.
    pub fn describe(&self, kind: ModelKind) -> serde_json::Value {
        match kind {
            ModelKind::LogisticRegression => serde_json::json!({
                "C": self.logistic.c,
                "max_iter": self.logistic.max_iterations,
                "random_state": self.seed,
            }),
            ModelKind::RandomForest => serde_json::json!({
                "n_estimators": self.forest.n_estimators,
                "max_depth": self.forest.max_depth,
                "min_samples_split": self.forest.min_samples_split,
                "max_features": self
                    .forest
                    .max_features
                    .map_or_else(|| serde_json::json!("sqrt"), |k| serde_json::json!(k)),
                "random_state": self.seed,
            }),
        }
    }
}

/// L2-regularized logistic regression
#[derive(Debug, Serialize, Deserialize)]
pub struct LogisticClassifier {
    model: FittedLogisticRegression<f64, usize>,
    /// Label whose probability `predict_probabilities` reports
    positive_class: usize,
    n_features: usize,
}

impl LogisticClassifier {
    pub fn fit(params: &LogisticParams, x: &Array2<f64>, y: &Array1<usize>) -> Result<Self> {
        ensure!(params.c > 0.0, "Regularization strength C must be positive");
        let dataset = Dataset::new(x.to_owned(), y.to_owned());

        let model = LogisticRegression::default()
            .alpha(1.0 / params.c)
            .max_iterations(params.max_iterations)
            .fit(&dataset)
            .map_err(|e| anyhow!("Logistic regression fit failed: {e}"))?;

        // `predict_probabilities` reports the probability of `labels().pos`.
        let positive_class = model.labels().pos.class;

        Ok(Self {
            model,
            positive_class,
            n_features: x.ncols(),
        })
    }

    fn positive_probabilities(&self, x: &Array2<f64>) -> Array1<f64> {
        let p = self.model.predict_probabilities(x);
        if self.positive_class == 1 {
            p
        } else {
            p.mapv(|v| 1.0 - v)
        }
    }
}

/// One member of the forest and the feature columns it was grown on
#[derive(Debug, Serialize, Deserialize)]
struct ForestTree {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

/// Bagged ensemble of Gini decision trees, each grown on a random subset of
/// the features
#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<ForestTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    /// Fit `n_estimators` trees, each on a bootstrap sample of the rows and a
    /// subset of the columns, drawn from a generator seeded with `seed`.
    pub fn fit(
        params: &ForestParams,
        seed: u64,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<Self> {
        ensure!(params.n_estimators > 0, "Random forest needs at least one tree");
        ensure!(x.nrows() > 0, "Cannot fit random forest on an empty matrix");

        let (n, n_features) = x.dim();
        let per_tree = features_per_tree(params.max_features, n_features)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let tree_params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(Some(params.max_depth))
            .min_weight_split(params.min_samples_split as f32);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for i in 0..params.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut features = index::sample(&mut rng, n_features, per_tree).into_vec();
            features.sort_unstable();

            let dataset = Dataset::new(
                x.select(Axis(0), &sample).select(Axis(1), &features),
                y.select(Axis(0), &sample),
            );
            let tree = tree_params
                .fit(&dataset)
                .map_err(|e| anyhow!("Decision tree {i} fit failed: {e}"))?;
            trees.push(ForestTree { features, tree });
        }

        Ok(Self { trees, n_features })
    }

    /// Fraction of trees voting for class 1.
    fn positive_probabilities(&self, x: &Array2<f64>) -> Array1<f64> {
        let mut votes = Array1::<f64>::zeros(x.nrows());
        for member in &self.trees {
            let columns = x.select(Axis(1), &member.features);
            let predicted: Array1<usize> = member.tree.predict(&columns);
            votes.zip_mut_with(&predicted, |v, c| {
                if *c == 1 {
                    *v += 1.0
                }
            });
        }
        votes / self.trees.len() as f64
    }
}

/// Columns each tree sees: `max_features` if set, otherwise the square root
/// of the column count, rounded down.
fn features_per_tree(max_features: Option<usize>, n_features: usize) -> Result<usize> {
    ensure!(n_features > 0, "Cannot fit random forest without features");
    let sqrt = ((n_features as f64).sqrt() as usize).max(1);
    let k = max_features.unwrap_or(sqrt);
    ensure!(
        (1..=n_features).contains(&k),
        "max_features must be between 1 and {n_features}, got {k}"
    );
    Ok(k)
}

/// A fitted candidate model
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticClassifier),
    RandomForest(RandomForestClassifier),
}

impl Classifier {
    /// Fit a fresh model of `kind` on scaled features.
    pub fn fit(
        kind: ModelKind,
        params: &Hyperparameters,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<Self> {
        ensure!(
            x.nrows() == y.len(),
            "Feature rows ({}) and labels ({}) differ",
            x.nrows(),
            y.len()
        );
        if let Some(bad) = y.iter().find(|c| **c > 1) {
            bail!("Labels must be 0 or 1, found {bad}");
        }

        Ok(match kind {
            ModelKind::LogisticRegression => {
                Classifier::LogisticRegression(LogisticClassifier::fit(&params.logistic, x, y)?)
            }
            ModelKind::RandomForest => Classifier::RandomForest(RandomForestClassifier::fit(
                &params.forest,
                params.seed,
                x,
                y,
            )?),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::LogisticRegression(_) => ModelKind::LogisticRegression,
            Classifier::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    /// Number of feature columns the model was fit on
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::LogisticRegression(m) => m.n_features,
            Classifier::RandomForest(m) => m.n_features,
        }
    }

    /// Probability of class 1 for each row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        ensure!(
            x.ncols() == self.n_features(),
            "{} expects {} features, got {}",
            self.kind(),
            self.n_features(),
            x.ncols()
        );
        let p = match self {
            Classifier::LogisticRegression(m) => m.positive_probabilities(x),
            Classifier::RandomForest(m) => m.positive_probabilities(x),
        };
        ensure!(
            p.iter().all(|v| v.is_finite()),
            "{} produced a non-finite probability",
            self.kind()
        );
        Ok(p)
    }

    /// Predicted class for each row (1 when the class-1 probability exceeds 0.5).
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self.predict_proba(x)?.mapv(|p| usize::from(p > 0.5)))
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Load a persisted model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read model {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse model {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated clusters; label 1 when the first feature is large.
    fn separable(n: usize) -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let class = (i % 2) as f64;
            let jitter = ((i * 7 + j * 3) % 11) as f64 / 11.0 - 0.5;
            match j {
                0 => class * 4.0 - 2.0 + jitter,
                1 => jitter,
                _ => -jitter,
            }
        });
        let y = (0..n).map(|i| i % 2).collect();
        (x, y)
    }

    fn params() -> Hyperparameters {
        Hyperparameters {
            logistic: LogisticParams {
                c: 1.0,
                max_iterations: 1000,
            },
            forest: ForestParams {
                n_estimators: 15,
                max_depth: 5,
                min_samples_split: 2,
                max_features: Some(3),
            },
            seed: 42,
        }
    }

    #[test]
    fn test_model_kind_identifiers() {
        assert_eq!(ModelKind::LogisticRegression.to_string(), "logistic_regression");
        assert_eq!("random_forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!(
            " logistic_regression\n".parse::<ModelKind>().unwrap(),
            ModelKind::LogisticRegression
        );
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_candidates_learn_separable_data() {
        let (x, y) = separable(60);
        for kind in ModelKind::ALL {
            let model = Classifier::fit(kind, &params(), &x, &y).unwrap();
            assert_eq!(model.kind(), kind);

            let predicted = model.predict(&x).unwrap();
            let correct = predicted.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
            assert!(correct >= 57, "{kind} only got {correct}/60");

            let proba = model.predict_proba(&x).unwrap();
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
            assert!(proba[1] > proba[0]);
        }
    }

    #[test]
    fn test_logistic_fits_uninformative_features() {
        let x = Array2::from_elem((20, 3), 1.0);
        let y: Array1<usize> = (0..20).map(|i| i % 2).collect();
        let model = Classifier::fit(ModelKind::LogisticRegression, &params(), &x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (p - 0.5).abs() < 0.05), "{proba}");
    }

    #[test]
    fn test_logistic_probability_tracks_label_one() {
        let (x, y) = separable(40);
        let flipped: Array1<usize> = y.mapv(|c| 1 - c);
        let model =
            Classifier::fit(ModelKind::LogisticRegression, &params(), &x, &flipped).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] > 0.5);
        assert!(proba[1] < 0.5);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let (x, y) = separable(40);
        let a = Classifier::fit(ModelKind::RandomForest, &params(), &x, &y).unwrap();
        let b = Classifier::fit(ModelKind::RandomForest, &params(), &x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_forest_trees_see_feature_subsets() {
        let (x, y) = separable(40);
        let mut p = params();
        p.forest.max_features = Some(2);
        let forest = RandomForestClassifier::fit(&p.forest, p.seed, &x, &y).unwrap();

        for member in &forest.trees {
            assert_eq!(member.features.len(), 2);
            assert!(member.features.windows(2).all(|w| w[0] < w[1]));
        }
        let distinct: std::collections::HashSet<&Vec<usize>> =
            forest.trees.iter().map(|m| &m.features).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_features_per_tree() {
        assert_eq!(features_per_tree(None, 13).unwrap(), 3);
        assert_eq!(features_per_tree(None, 1).unwrap(), 1);
        assert_eq!(features_per_tree(Some(13), 13).unwrap(), 13);
        assert!(features_per_tree(Some(0), 13).is_err());
        assert!(features_per_tree(Some(14), 13).is_err());
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (x, y) = separable(40);
        let model = Classifier::fit(ModelKind::LogisticRegression, &params(), &x, &y).unwrap();
        assert!(model.predict(&Array2::zeros((1, 5))).is_err());
    }

    #[test]
    fn test_fit_rejects_non_binary_labels() {
        let (x, mut y) = separable(10);
        y[0] = 3;
        assert!(Classifier::fit(ModelKind::RandomForest, &params(), &x, &y).is_err());
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = separable(40);

        for kind in ModelKind::ALL {
            let path = dir.path().join(format!("{kind}.json"));
            let model = Classifier::fit(kind, &params(), &x, &y).unwrap();
            std::fs::write(&path, model.to_bytes().unwrap()).unwrap();

            let loaded = Classifier::load(&path).unwrap();
            assert_eq!(loaded.kind(), kind);
            assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
        }
    }
}
