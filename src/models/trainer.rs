//! Candidate training, cross-validation and holdout evaluation

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::data::split::stratified_split;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::{Classifier, Hyperparameters, ModelKind};
use crate::models::evaluation::{accuracy, CrossValidation, EvaluationMetrics};
use crate::models::selector::select_best;
use crate::scaler::StandardScaler;
use crate::types::record::{Record, FEATURE_NAMES};

/// What one candidate's training run produced, as recorded in the
/// experiment log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub kind: ModelKind,
    pub params: serde_json::Value,
    pub cross_validation: CrossValidation,
    pub metrics: EvaluationMetrics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A fitted candidate and its report
#[derive(Debug)]
pub struct TrainedCandidate {
    pub classifier: Classifier,
    pub report: CandidateReport,
}

/// Everything a successful training run produced, held in memory until
/// it is committed.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub scaler: StandardScaler,
    pub candidates: Vec<TrainedCandidate>,
    pub best: ModelKind,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainingOutcome {
    pub fn candidate(&self, kind: ModelKind) -> Option<&TrainedCandidate> {
        self.candidates.iter().find(|c| c.report.kind == kind)
    }

    pub fn best_candidate(&self) -> Option<&TrainedCandidate> {
        self.candidate(self.best)
    }
}

/// Trains every candidate kind on one dataset and selects the best.
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            logistic: self.config.logistic.clone(),
            forest: self.config.forest.clone(),
            seed: self.config.seed,
        }
    }

    /// Split, scale, fit and evaluate both candidates, then select by
    /// holdout ROC-AUC. Any failure aborts the whole run.
    pub fn train(&self, records: &[Record]) -> Result<TrainingOutcome> {
        ensure!(
            self.config.cv_folds >= 2,
            "Cross-validation needs at least 2 folds, got {}",
            self.config.cv_folds
        );

        let split = stratified_split(records, self.config.test_size, self.config.seed);
        ensure!(
            !split.train.is_empty() && !split.test.is_empty(),
            "Dataset of {} rows is too small to split",
            records.len()
        );
        info!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            seed = self.config.seed,
            "Dataset split"
        );

        let extractor = FeatureExtractor::new();
        let x_train_raw = extractor.matrix(&split.train);
        let y_train = extractor.labels(&split.train);
        let y_test = extractor.labels(&split.test);

        // fit on the training partition only
        let scaler = StandardScaler::fit(&x_train_raw, &FEATURE_NAMES)?;
        let x_train = scaler.transform(&x_train_raw)?;
        let x_test = scaler.transform(&extractor.matrix(&split.test))?;

        let candidates = ModelKind::ALL
            .into_iter()
            .map(|kind| self.train_candidate(kind, &x_train, &y_train, &x_test, &y_test))
            .collect::<Result<Vec<_>>>()?;

        let scores: Vec<(ModelKind, f64)> = candidates
            .iter()
            .map(|c| (c.report.kind, c.report.metrics.roc_auc))
            .collect();
        let best = select_best(&scores).context("No candidate produced a usable ROC-AUC")?;
        info!(best_model = %best, "Best model selected");

        Ok(TrainingOutcome {
            scaler,
            candidates,
            best,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }

    fn train_candidate(
        &self,
        kind: ModelKind,
        x_train: &Array2<f64>,
        y_train: &Array1<usize>,
        x_test: &Array2<f64>,
        y_test: &Array1<usize>,
    ) -> Result<TrainedCandidate> {
        let started_at = Utc::now();
        let params = self.hyperparameters();
        info!(model = %kind, params = %params.describe(kind), "Training candidate");

        let classifier = Classifier::fit(kind, &params, x_train, y_train)
            .with_context(|| format!("Failed to fit {kind}"))?;

        let cross_validation = self
            .cross_validate(kind, x_train, y_train)
            .with_context(|| format!("Cross-validation of {kind} failed"))?;

        let y_pred = classifier.predict(x_test)?;
        let y_score = classifier.predict_proba(x_test)?;
        let metrics = EvaluationMetrics::compute(
            y_test.as_slice().context("labels not contiguous")?,
            y_pred.as_slice().context("predictions not contiguous")?,
            y_score.as_slice().context("scores not contiguous")?,
        )
        .with_context(|| format!("Failed to evaluate {kind}"))?;

        info!(
            model = %kind,
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            roc_auc = metrics.roc_auc,
            cv_mean = cross_validation.mean,
            cv_std = cross_validation.std,
            "Candidate evaluated"
        );

        Ok(TrainedCandidate {
            classifier,
            report: CandidateReport {
                kind,
                params: params.describe(kind),
                cross_validation,
                metrics,
                started_at,
                finished_at: Utc::now(),
            },
        })
    }

    /// Stratified k-fold cross-validation scored by accuracy.
    ///
    /// Diagnostic only; selection never looks at it.
    pub fn cross_validate(
        &self,
        kind: ModelKind,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<CrossValidation> {
        let params = self.hyperparameters();
        let folds = stratified_folds(y, self.config.cv_folds);

        let mut scores = Vec::with_capacity(folds.len());
        for (i, test_idx) in folds.iter().enumerate() {
            ensure!(!test_idx.is_empty(), "Fold {i} is empty");
            let mut in_test = vec![false; y.len()];
            for &j in test_idx {
                in_test[j] = true;
            }
            let train_idx: Vec<usize> = (0..y.len()).filter(|j| !in_test[*j]).collect();

            let model = Classifier::fit(
                kind,
                &params,
                &x.select(Axis(0), &train_idx),
                &y.select(Axis(0), &train_idx),
            )?;
            let predicted = model.predict(&x.select(Axis(0), test_idx))?;
            let truth = y.select(Axis(0), test_idx);
            let score = accuracy(&truth.to_vec(), &predicted.to_vec());

            debug!(model = %kind, fold = i, score, "Fold scored");
            scores.push(score);
        }

        Ok(CrossValidation::from_scores(scores))
    }
}

/// Assign row indices to `k` folds, dealing each class round-robin so every
/// fold keeps the label proportions. Returns the held-out indices per fold.
pub fn stratified_folds(y: &Array1<usize>, k: usize) -> Vec<Vec<usize>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, label) in y.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for members in by_class.values() {
        for &i in members {
            folds[next % k].push(i);
            next += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}
