//! Pieces shared by the discriminative models.

use nalgebra::DMatrix;
use patrec_optim::{OptimizeResult, Termination};
use patrec_prob::decide_threshold;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// What the optimizer reported for a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Objective value at the returned parameters.
    pub objective: f64,
    pub iterations: usize,
    /// Objective evaluations, finite-difference probes included.
    pub evaluations: usize,
    pub status: Termination,
}

impl TrainingSummary {
    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }
}

impl From<&OptimizeResult> for TrainingSummary {
    fn from(result: &OptimizeResult) -> Self {
        Self {
            objective: result.value,
            iterations: result.iterations,
            evaluations: result.evaluations,
            status: result.status,
        }
    }
}

/// A fitted binary model that maps samples to real scores, larger meaning
/// more target-like.
pub trait BinaryScorer {
    /// One score per column of `x`.
    fn scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError>;

    /// Class 1 where `score > threshold`.
    fn predict(&self, x: &DMatrix<f64>, threshold: f64) -> Result<Vec<usize>, ModelError> {
        Ok(decide_threshold(&self.scores(x)?, threshold))
    }
}

/// Check `labels` against the `n` columns of the training matrix and map
/// them to `±1`. Both classes must be present.
pub(crate) fn signed_labels(labels: &[usize], n: usize) -> Result<Vec<f64>, ModelError> {
    if labels.len() != n {
        return Err(ModelError::DimensionMismatch {
            context: "labels",
            expected: n,
            got: labels.len(),
        });
    }
    if let Some(&label) = labels.iter().find(|&&l| l > 1) {
        return Err(ModelError::NotBinaryLabel { label });
    }
    let n_targets = labels.iter().filter(|&&l| l == 1).count();
    if n_targets == 0 {
        return Err(ModelError::MissingClass { class: 1 });
    }
    if n_targets == n {
        return Err(ModelError::MissingClass { class: 0 });
    }
    Ok(labels.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect())
}

pub(crate) fn check_features(
    context: &'static str,
    x: &DMatrix<f64>,
    expected: usize,
) -> Result<(), ModelError> {
    if x.nrows() != expected {
        return Err(ModelError::DimensionMismatch {
            context,
            expected,
            got: x.nrows(),
        });
    }
    Ok(())
}
