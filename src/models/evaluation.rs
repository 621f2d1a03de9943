//! Holdout metrics for binary classifiers

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Holdout metrics of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
}

impl EvaluationMetrics {
    /// Compute all metrics from true labels, predicted labels and
    /// positive-class probabilities.
    pub fn compute(y_true: &[usize], y_pred: &[usize], y_score: &[f64]) -> Result<Self> {
        ensure!(
            y_true.len() == y_pred.len() && y_true.len() == y_score.len(),
            "Label, prediction and score lengths differ"
        );
        ensure!(!y_true.is_empty(), "Cannot evaluate on an empty holdout set");

        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            precision: precision(y_true, y_pred),
            recall: recall(y_true, y_pred),
            roc_auc: roc_auc(y_true, y_score)?,
        })
    }
}

/// Fraction of exact matches.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

struct Confusion {
    tp: usize,
    fp: usize,
    fn_: usize,
}

fn confusion(y_true: &[usize], y_pred: &[usize]) -> Confusion {
    let mut c = Confusion { tp: 0, fp: 0, fn_: 0 };
    for (t, p) in y_true.iter().zip(y_pred) {
        match (*t == 1, *p == 1) {
            (true, true) => c.tp += 1,
            (false, true) => c.fp += 1,
            (true, false) => c.fn_ += 1,
            (false, false) => {}
        }
    }
    c
}

/// TP / (TP + FP); 0 when nothing was predicted positive.
pub fn precision(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let c = confusion(y_true, y_pred);
    ratio(c.tp, c.tp + c.fp)
}

/// TP / (TP + FN); 0 when there are no positives.
pub fn recall(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let c = confusion(y_true, y_pred);
    ratio(c.tp, c.tp + c.fn_)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic.
///
/// Tied scores share their average rank. Both classes must be present.
pub fn roc_auc(y_true: &[usize], y_score: &[f64]) -> Result<f64> {
    ensure!(y_true.len() == y_score.len(), "Label and score lengths differ");
    ensure!(
        y_score.iter().all(|s| s.is_finite()),
        "ROC-AUC requires finite scores"
    );

    let n_pos = y_true.iter().filter(|t| **t == 1).count();
    let n_neg = y_true.len() - n_pos;
    ensure!(
        n_pos > 0 && n_neg > 0,
        "ROC-AUC is undefined when only one class is present"
    );

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| y_score[a].total_cmp(&y_score[b]));

    let mut ranks = vec![0.0; y_score.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        // ranks are 1-based; ties share the mean of i+1..=j+1
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(t, _)| **t == 1)
        .map(|(_, r)| r)
        .sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

/// Mean and population standard deviation of fold scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CrossValidation {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        Self { scores, mean, std }
    }
}
