//! Deterministic, label-stratified train/test partitioning.
//!
//! The test partition has `ceil(test_ratio * n)` samples. Each class receives
//! a share proportional to its frequency: the floor of its exact share first,
//! then one extra slot per class in order of largest fractional remainder
//! (lower class index on ties) until the total is met. A class never gives up
//! all of its members to the test partition.
//!
//! Members of each class are shuffled with a `ChaCha8Rng` seeded from `seed`,
//! visiting classes in ascending index order, so equal inputs always yield
//! equal partitions.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TEST_RATIO: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("cannot split an empty dataset")]
    Empty,

    #[error("test ratio must be strictly between 0 and 1, got {0}")]
    InvalidRatio(f64),

    #[error("class {class} has only {count} member(s); a stratified split needs at least 2")]
    ClassTooSmall { class: usize, count: usize },

    #[error("{partition} size {size} is smaller than the number of classes ({classes})")]
    PartitionTooSmall {
        partition: &'static str,
        size: usize,
        classes: usize,
    },

    #[error("test index {index} out of range for {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("test index {0} listed more than once")]
    DuplicateIndex(usize),
}

/// Disjoint row indices into the loaded dataset, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition samples by their encoded labels.
pub fn stratified_split(labels: &[usize], test_ratio: f64, seed: u64) -> Result<Split, SplitError> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(SplitError::InvalidRatio(test_ratio));
    }
    let n = labels.len();
    if n == 0 {
        return Err(SplitError::Empty);
    }

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(i);
    }
    if let Some((&class, rows)) = members.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(SplitError::ClassTooSmall {
            class,
            count: rows.len(),
        });
    }

    // Guard against products such as 0.2 * 15 landing just above an integer.
    let n_test = ((test_ratio * n as f64) - 1e-9).ceil().max(0.0) as usize;
    let n_train = n - n_test;
    let classes = members.len();
    if n_test < classes {
        return Err(SplitError::PartitionTooSmall {
            partition: "test",
            size: n_test,
            classes,
        });
    }
    if n_train < classes {
        return Err(SplitError::PartitionTooSmall {
            partition: "train",
            size: n_train,
            classes,
        });
    }

    let counts: Vec<usize> = members.values().map(Vec::len).collect();
    let allocation = allocate_test_counts(&counts, n_test);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, take) in members.into_values().zip(allocation) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    debug!(train = train.len(), test = test.len(), classes, seed, "stratified split");
    Ok(Split { train, test })
}

/// Build a split from a persisted test partition; train is the complement.
pub fn split_from_test_indices(len: usize, test_indices: &[usize]) -> Result<Split, SplitError> {
    let mut in_test = vec![false; len];
    for &index in test_indices {
        if index >= len {
            return Err(SplitError::IndexOutOfRange { index, len });
        }
        if in_test[index] {
            return Err(SplitError::DuplicateIndex(index));
        }
        in_test[index] = true;
    }

    let (test, train): (Vec<usize>, Vec<usize>) = (0..len).partition(|&i| in_test[i]);
    Ok(Split { train, test })
}

/// Per-class test counts summing to `n_test`, by largest remainder.
fn allocate_test_counts(class_counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = class_counts.iter().sum();
    let mut alloc: Vec<usize> = class_counts.iter().map(|&c| n_test * c / n).collect();
    let mut remaining = n_test - alloc.iter().sum::<usize>();

    let mut order: Vec<usize> = (0..class_counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = (n_test * class_counts[a]) % n;
        let rb = (n_test * class_counts[b]) % n;
        rb.cmp(&ra).then(a.cmp(&b))
    });

    while remaining > 0 {
        let mut progressed = false;
        for &i in &order {
            if remaining == 0 {
                break;
            }
            if alloc[i] + 1 < class_counts[i] {
                alloc[i] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    alloc
}
