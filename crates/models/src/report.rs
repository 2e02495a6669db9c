//! One-line evaluation summaries for binary scorers.

use std::fmt;

use nalgebra::DMatrix;
use patrec_eval::{
    error_rate, min_dcf_from_sweep, normalized_bayes_risk, ConfusionMatrix, DcfOptions, MinDcf,
    ThresholdSweep,
};
use patrec_prob::{decide_binary, BinaryApplication};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::training::BinaryScorer;

/// Error rate, actual DCF and minimum DCF of one set of scores under one
/// application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryReport {
    pub application: BinaryApplication,
    /// Fraction of samples misclassified at the Bayes threshold.
    pub error_rate: f64,
    pub actual_dcf: f64,
    pub min_dcf: MinDcf,
}

impl BinaryReport {
    /// Evaluate scores that are treated as LLRs.
    pub fn evaluate(
        scores: &[f64],
        labels: &[usize],
        app: &BinaryApplication,
        opts: &DcfOptions,
    ) -> Result<Self, ModelError> {
        let sweep = ThresholdSweep::new(scores, labels)?;
        Self::from_sweep(scores, labels, &sweep, app, opts)
    }

    /// Evaluate a fitted model on held-out samples.
    pub fn for_model<M: BinaryScorer + ?Sized>(
        model: &M,
        x: &DMatrix<f64>,
        labels: &[usize],
        app: &BinaryApplication,
        opts: &DcfOptions,
    ) -> Result<Self, ModelError> {
        Self::evaluate(&model.scores(x)?, labels, app, opts)
    }

    /// One report per application, sharing a single sorted sweep.
    pub fn evaluate_many(
        scores: &[f64],
        labels: &[usize],
        apps: &[BinaryApplication],
        opts: &DcfOptions,
    ) -> Result<Vec<Self>, ModelError> {
        let sweep = ThresholdSweep::new(scores, labels)?;
        apps.iter()
            .map(|app| Self::from_sweep(scores, labels, &sweep, app, opts))
            .collect()
    }

    fn from_sweep(
        scores: &[f64],
        labels: &[usize],
        sweep: &ThresholdSweep,
        app: &BinaryApplication,
        opts: &DcfOptions,
    ) -> Result<Self, ModelError> {
        let application = app.validate()?;
        let decisions = decide_binary(scores, &application);
        let cm = ConfusionMatrix::new(&decisions, labels, 2)?;
        Ok(Self {
            application,
            error_rate: error_rate(&decisions, labels)?,
            actual_dcf: normalized_bayes_risk(&cm, &application, opts)?,
            min_dcf: min_dcf_from_sweep(sweep, &application, opts)?,
        })
    }

    /// `actDCF - minDCF`, the cost of the threshold the scores imply.
    pub fn calibration_loss(&self) -> f64 {
        self.actual_dcf - self.min_dcf.value
    }
}

impl fmt::Display for BinaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "π={:.3} Cfn={} Cfp={}: err {:.2}% actDCF {:.4} minDCF {:.4}",
            self.application.prior,
            self.application.cfn,
            self.application.cfp,
            100.0 * self.error_rate,
            self.actual_dcf,
            self.min_dcf.value,
        )
    }
}
