//! Labelled feature matrices.
//!
//! A [`Dataset`] is the hand-off shape between whatever loader produced the
//! data and the estimators: a `D × N` matrix with one column per sample and
//! a length-N label vector with values in `0..K`. Labels are fixed at
//! construction and never mutated afterwards.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CoreError;

/// A labelled `D × N` feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    features: DMatrix<f64>,
    labels: Vec<usize>,
    n_classes: usize,
}

impl Dataset {
    /// Build a dataset, inferring the class count as `max(label) + 1`.
    ///
    /// # Errors
    /// Returns an error if there are no samples or if the label vector length
    /// differs from the number of columns.
    pub fn new(features: DMatrix<f64>, labels: Vec<usize>) -> Result<Self, CoreError> {
        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        Self::with_classes(features, labels, n_classes)
    }

    /// Build a dataset with an explicit class count.
    ///
    /// Useful when a split leaves some class without samples but downstream
    /// code still needs the full label space.
    pub fn with_classes(
        features: DMatrix<f64>,
        labels: Vec<usize>,
        n_classes: usize,
    ) -> Result<Self, CoreError> {
        if features.ncols() == 0 {
            return Err(CoreError::Empty { what: "samples" });
        }
        check_labels(&labels, features.ncols(), n_classes)?;
        Ok(Self {
            features,
            labels,
            n_classes,
        })
    }

    /// The `D × N` feature matrix.
    pub fn features(&self) -> &DMatrix<f64> {
        &self.features
    }

    /// The length-N label vector.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of samples carrying each label.
    pub fn class_counts(&self) -> Vec<usize> {
        class_counts(&self.labels, self.n_classes)
    }

    /// The columns whose label equals `class`.
    pub fn class_samples(&self, class: usize) -> Result<DMatrix<f64>, CoreError> {
        class_samples(&self.features, &self.labels, class)
    }

    /// Split into one matrix per class, in class order.
    pub fn partition(&self) -> Result<Vec<DMatrix<f64>>, CoreError> {
        partition_by_class(&self.features, &self.labels, self.n_classes)
    }

    /// Random 2-to-1 split into training and validation sets.
    ///
    /// The samples are permuted with a generator seeded by `seed`; the first
    /// ⌊2N/3⌋ go to training and the rest to validation. The same seed always
    /// gives the same split.
    pub fn split_2to1(&self, seed: u64) -> Result<(Dataset, Dataset), CoreError> {
        let n = self.n_samples();
        let n_train = n * 2 / 3;
        if n_train == 0 || n_train == n {
            return Err(CoreError::invalid(
                "samples",
                format!("cannot split {n} samples 2-to-1"),
            ));
        }

        let mut idx: Vec<usize> = (0..n).collect();
        idx.shuffle(&mut StdRng::seed_from_u64(seed));
        let (train_idx, val_idx) = idx.split_at(n_train);

        debug!(
            n_train = train_idx.len(),
            n_val = val_idx.len(),
            seed,
            "2-to-1 dataset split"
        );

        Ok((self.subset(train_idx), self.subset(val_idx)))
    }

    fn subset(&self, idx: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select_columns(idx.iter()),
            labels: idx.iter().map(|&i| self.labels[i]).collect(),
            n_classes: self.n_classes,
        }
    }
}

/// Verify a label vector against a sample count and class count.
pub fn check_labels(labels: &[usize], n_samples: usize, n_classes: usize) -> Result<(), CoreError> {
    if labels.len() != n_samples {
        return Err(CoreError::DimensionMismatch {
            context: "labels",
            expected: n_samples,
            got: labels.len(),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(CoreError::LabelOutOfRange {
            label: bad,
            n_classes,
        });
    }
    Ok(())
}

/// Number of samples carrying each label in `0..n_classes`.
pub fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &l in labels {
        if l < n_classes {
            counts[l] += 1;
        }
    }
    counts
}

/// The columns of `x` whose label equals `class`.
///
/// # Errors
/// `EmptyClass` if no sample carries the label.
pub fn class_samples(
    x: &DMatrix<f64>,
    labels: &[usize],
    class: usize,
) -> Result<DMatrix<f64>, CoreError> {
    if labels.len() != x.ncols() {
        return Err(CoreError::DimensionMismatch {
            context: "labels",
            expected: x.ncols(),
            got: labels.len(),
        });
    }
    let idx: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == class)
        .map(|(i, _)| i)
        .collect();
    if idx.is_empty() {
        return Err(CoreError::EmptyClass { class });
    }
    Ok(x.select_columns(idx.iter()))
}

/// One matrix per class `0..n_classes`; every class must be populated.
pub fn partition_by_class(
    x: &DMatrix<f64>,
    labels: &[usize],
    n_classes: usize,
) -> Result<Vec<DMatrix<f64>>, CoreError> {
    check_labels(labels, x.ncols(), n_classes)?;
    (0..n_classes)
        .map(|c| class_samples(x, labels, c))
        .collect()
}
