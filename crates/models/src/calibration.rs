//! Score calibration and fusion.
//!
//! A prior-weighted logistic regression without regularization is trained
//! on the scores themselves (one row per system). Its output, minus the
//! target prior log-odds, is a calibrated LLR: `wᵀs + b - ln(π/(1-π))`.
//! With a single row this is an affine recalibration of one system, with
//! several it is a linear fusion.

use nalgebra::DMatrix;
use patrec_core::matrix::vrow;
use patrec_optim::LbfgsOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::logreg::{LogRegConfig, LogisticRegression};
use crate::training::BinaryScorer;

/// A fitted affine map from system scores to calibrated LLRs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCalibrator {
    model: LogisticRegression,
    target_prior: f64,
}

impl ScoreCalibrator {
    /// Fit on an `S × N` matrix of scores from `S` systems.
    pub fn fit(scores: &DMatrix<f64>, labels: &[usize], target_prior: f64) -> Result<Self, ModelError> {
        Self::fit_with(scores, labels, target_prior, LbfgsOptions::default())
    }

    /// Like [`fit`](Self::fit) with explicit optimizer options.
    pub fn fit_with(
        scores: &DMatrix<f64>,
        labels: &[usize],
        target_prior: f64,
        optimizer: LbfgsOptions,
    ) -> Result<Self, ModelError> {
        let config = LogRegConfig::default()
            .with_lambda(0.0)
            .with_prior_weighting(target_prior)
            .with_optimizer(optimizer);
        let model = LogisticRegression::fit(scores, labels, &config)?;
        debug!(
            weights = ?model.weights().as_slice(),
            bias = model.bias(),
            target_prior,
            "score calibrator fit"
        );
        Ok(Self {
            model,
            target_prior,
        })
    }

    /// Fit on the scores of one system.
    pub fn fit_single(scores: &[f64], labels: &[usize], target_prior: f64) -> Result<Self, ModelError> {
        Self::fit(&vrow(scores), labels, target_prior)
    }

    pub fn target_prior(&self) -> f64 {
        self.target_prior
    }

    /// One weight per system.
    pub fn weights(&self) -> &[f64] {
        self.model.weights().as_slice()
    }

    /// The fitted offset `b`, before the prior log-odds are removed.
    pub fn bias(&self) -> f64 {
        self.model.bias()
    }

    /// Calibrated LLRs for an `S × N` score matrix.
    pub fn calibrate(&self, scores: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        self.model.llr(scores)
    }

    pub fn calibrate_single(&self, scores: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.calibrate(&vrow(scores))
    }
}

impl BinaryScorer for ScoreCalibrator {
    fn scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        self.calibrate(x)
    }
}

/// Out-of-fold calibration: sample `i` goes to fold `i mod k`, and each
/// fold is calibrated by a model trained on the other `k - 1`.
///
/// Returns calibrated scores in the input order, so they can be evaluated
/// against `labels` directly.
pub fn calibrate_k_fold(
    scores: &DMatrix<f64>,
    labels: &[usize],
    target_prior: f64,
    k: usize,
) -> Result<Vec<f64>, ModelError> {
    let n = scores.ncols();
    if labels.len() != n {
        return Err(ModelError::DimensionMismatch {
            context: "labels",
            expected: n,
            got: labels.len(),
        });
    }
    if k < 2 || k > n {
        return Err(ModelError::invalid(
            "k",
            format!("need 2 <= k <= {n} folds, got {k}"),
        ));
    }

    let mut calibrated = vec![0.0; n];
    for fold in 0..k {
        let (held, kept): (Vec<usize>, Vec<usize>) = (0..n).partition(|i| i % k == fold);
        let train_labels: Vec<usize> = kept.iter().map(|&i| labels[i]).collect();
        let calibrator = ScoreCalibrator::fit(
            &scores.select_columns(kept.iter()),
            &train_labels,
            target_prior,
        )?;
        let out = calibrator.calibrate(&scores.select_columns(held.iter()))?;
        for (&i, s) in held.iter().zip(out) {
            calibrated[i] = s;
        }
    }
    Ok(calibrated)
}
