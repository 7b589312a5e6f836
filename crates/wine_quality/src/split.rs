//! Stratified 80/20 train/test split
//!
//! Test size is `ceil(n / 5)`. Each class receives the floor of its
//! proportional share, and leftover test slots go to the classes with the
//! largest remainders. Members of a class are chosen by a seeded shuffle.

use crate::dataset::Label;
use crate::deterministic::seeded_rng;
use crate::errors::{PipelineError, Result};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Percentage of records held out for testing
pub const TEST_PERCENT: usize = 20;

const CLASSES: [Label; 2] = [Label::Bad, Label::Good];

/// Record indices of each partition, ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition record positions into stratified train/test sets
pub fn stratified_split(labels: &[Label], seed: u64) -> Result<SplitIndices> {
    let n = labels.len();
    let n_test = (n * TEST_PERCENT).div_ceil(100);
    let n_train = n - n_test;

    let members: Vec<Vec<usize>> = CLASSES
        .iter()
        .map(|class| (0..n).filter(|&i| labels[i] == *class).collect())
        .collect();

    for (class, idx) in CLASSES.iter().zip(&members) {
        if idx.len() < 2 {
            return Err(PipelineError::InsufficientData(format!(
                "class '{}' has {} record(s); stratified split needs at least 2 per class",
                class,
                idx.len()
            )));
        }
    }
    if n_test < CLASSES.len() || n_train < CLASSES.len() {
        return Err(PipelineError::InsufficientData(format!(
            "{} records cannot be split into train/test partitions holding both classes",
            n
        )));
    }

    let test_counts = allocate_test_counts(&members, n, n_test);

    let mut rng = seeded_rng(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);

    for (idx, &take) in members.iter().zip(&test_counts) {
        let mut shuffled = idx.clone();
        shuffled.shuffle(&mut rng);
        test.extend_from_slice(&shuffled[..take]);
        train.extend_from_slice(&shuffled[take..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    info!(
        "Stratified split (seed {}): {} train / {} test",
        seed,
        train.len(),
        test.len()
    );

    Ok(SplitIndices { train, test })
}

/// Largest-remainder apportionment of `n_test` slots across classes
fn allocate_test_counts(members: &[Vec<usize>], n: usize, n_test: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = members.iter().map(|m| m.len() * n_test / n).collect();
    let mut remainders: Vec<(usize, usize)> = members
        .iter()
        .enumerate()
        .map(|(class, m)| ((m.len() * n_test) % n, class))
        .collect();

    // Largest remainder first; ties go to the larger class, then the lower label
    remainders.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| members[b.1].len().cmp(&members[a.1].len()))
            .then_with(|| a.1.cmp(&b.1))
    });

    let assigned: usize = counts.iter().sum();
    for &(_, class) in remainders.iter().take(n_test - assigned) {
        counts[class] += 1;
    }

    counts
}
