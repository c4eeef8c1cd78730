// ============================================================
// Layer 4 — Stratified Train/Test Splitter
// ============================================================
// Splits a dataset into train and test partitions while keeping
// the class proportions of the full dataset in both of them.
//
// Each class is shuffled on its own (seeded Fisher-Yates via
// rand::seq::SliceRandom) and `round(n_class * test_size)` of its
// samples go to the test partition. Both partitions are shuffled
// once more at the end so they are not ordered by class.
//
// The same seed always yields the same partition.

use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::Dataset;

/// Split `dataset` into `(train, test)` with label-stratified sampling.
///
/// # Arguments
/// * `test_size` - Fraction of every class that goes to the test set, in (0, 1)
/// * `seed`      - RNG seed; identical seeds give identical partitions
pub fn stratified_split(dataset: &Dataset, test_size: f64, seed: u64) -> (Dataset, Dataset) {
    let (train_idx, test_idx) = stratified_indices(dataset.labels(), test_size, seed);

    tracing::debug!(
        "Stratified split: {} train, {} test (test_size={})",
        train_idx.len(),
        test_idx.len(),
        test_size,
    );

    (dataset.select(&train_idx), dataset.select(&test_idx))
}

/// Index-level split behind [`stratified_split`].
pub fn stratified_indices(labels: &[usize], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);

    // BTreeMap keeps class iteration order fixed, so the RNG stream
    // is consumed identically on every run
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test  = Vec::new();

    for (_, mut members) in by_class {
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64) * test_size).round() as usize;
        let n_test = n_test.min(members.len());
        let rest   = members.split_off(n_test);
        test.extend(members);
        train.extend(rest);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    (train, test)
}
