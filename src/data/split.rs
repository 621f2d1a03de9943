//! Stratified train/holdout splitter
//!
//! Rows of each class are shuffled with a seeded RNG and the requested
//! fraction of every class moves to the holdout set, so label proportions
//! survive the split. The same input, fraction and seed always produce the
//! same partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use crate::types::record::Record;

/// Training and holdout partitions of a dataset
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<Record>,
    pub test: Vec<Record>,
}

/// Split `records` into training and holdout subsets.
///
/// Both subsets keep the original row order.
pub fn stratified_split(records: &[Record], test_fraction: f64, seed: u64) -> DatasetSplit {
    let indices = stratified_indices(
        &records.iter().map(|r| r.target).collect::<Vec<_>>(),
        test_fraction,
        seed,
    );

    let mut in_test = vec![false; records.len()];
    for i in indices {
        in_test[i] = true;
    }

    let (test, train): (Vec<_>, Vec<_>) = records
        .iter()
        .cloned()
        .zip(in_test)
        .partition(|(_, is_test)| *is_test);

    let split = DatasetSplit {
        train: train.into_iter().map(|(r, _)| r).collect(),
        test: test.into_iter().map(|(r, _)| r).collect(),
    };

    tracing::debug!(
        train = split.train.len(),
        test = split.test.len(),
        "Dataset split"
    );
    split
}

/// Indices selected for the holdout set, stratified by label.
pub fn stratified_indices(labels: &[u8], test_fraction: f64, seed: u64) -> Vec<usize> {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut selected = Vec::new();
    for (_, mut members) in by_class {
        members.shuffle(&mut rng);
        let take = ((members.len() as f64) * fraction).round() as usize;
        selected.extend_from_slice(&members[..take.min(members.len())]);
    }
    selected.sort_unstable();
    selected
}
