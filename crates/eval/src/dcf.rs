//! Binary detection cost: empirical Bayes risk, normalized DCF and minDCF.
//!
//! For an application `(π₁, Cfn, Cfp)` and error rates `Pfn`, `Pfp`:
//!
//! ```text
//! DCF      = π₁·Cfn·Pfn + (1 - π₁)·Cfp·Pfp
//! DCF_norm = DCF / min(π₁·Cfn, (1 - π₁)·Cfp)
//! ```
//!
//! The rates carry a pseudocount `ε`: `Pfn = (FN + ε) / (FN + TP + 2ε)`.

use patrec_prob::{decide_binary, BinaryApplication};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::confusion::{BinaryCounts, ConfusionMatrix};
use crate::error::EvalError;
use crate::sweep::{check_binary_input, ThresholdSweep};

/// Default rate pseudocount.
pub const DEFAULT_PSEUDOCOUNT: f64 = 1e-3;

/// Options shared by the DCF functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfOptions {
    /// Added to the error count, twice to the class count. `0.0` gives the
    /// exact rates.
    pub pseudocount: f64,
}

impl Default for DcfOptions {
    fn default() -> Self {
        Self {
            pseudocount: DEFAULT_PSEUDOCOUNT,
        }
    }
}

impl DcfOptions {
    /// Exact rates without smoothing.
    pub fn exact() -> Self {
        Self { pseudocount: 0.0 }
    }

    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    pub fn validate(self) -> Result<Self, EvalError> {
        if !(self.pseudocount >= 0.0 && self.pseudocount.is_finite()) {
            return Err(EvalError::InvalidParameter {
                name: "pseudocount".into(),
                reason: format!("{} is not a finite non-negative number", self.pseudocount),
            });
        }
        Ok(self)
    }
}

/// Miss and false-alarm rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorRates {
    /// `Pfn`, fraction of targets rejected.
    pub false_negative: f64,
    /// `Pfp`, fraction of non-targets accepted.
    pub false_positive: f64,
}

impl ErrorRates {
    fn from_counts(counts: &BinaryCounts, pseudocount: f64) -> Self {
        Self {
            false_negative: smoothed_rate(counts.false_negatives, counts.n_targets(), pseudocount),
            false_positive: smoothed_rate(
                counts.false_positives,
                counts.n_non_targets(),
                pseudocount,
            ),
        }
    }

    /// Unnormalized Bayes risk of these rates under `app`.
    pub fn risk(&self, app: &BinaryApplication) -> f64 {
        app.prior * app.cfn * self.false_negative
            + (1.0 - app.prior) * app.cfp * self.false_positive
    }
}

/// `(errors + ε) / (total + 2ε)`, or 0 when both are empty and `ε = 0`.
fn smoothed_rate(errors: usize, total: usize, pseudocount: f64) -> f64 {
    let denominator = total as f64 + 2.0 * pseudocount;
    if denominator == 0.0 {
        return 0.0;
    }
    (errors as f64 + pseudocount) / denominator
}

fn warn_absent_classes(counts: &BinaryCounts, pseudocount: f64) {
    for (class, total) in [(0, counts.n_non_targets()), (1, counts.n_targets())] {
        if total == 0 {
            let fallback = if pseudocount > 0.0 { 0.5 } else { 0.0 };
            warn!(class, pseudocount, fallback, "class absent from labels, rate falls back");
        }
    }
}

/// Pfn and Pfp of a binary confusion matrix.
pub fn error_rates(cm: &ConfusionMatrix, opts: &DcfOptions) -> Result<ErrorRates, EvalError> {
    let opts = opts.validate()?;
    let counts = cm.binary()?;
    warn_absent_classes(&counts, opts.pseudocount);
    Ok(ErrorRates::from_counts(&counts, opts.pseudocount))
}

/// Empirical Bayes risk `π₁·Cfn·Pfn + (1 - π₁)·Cfp·Pfp`.
pub fn bayes_risk(
    cm: &ConfusionMatrix,
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> Result<f64, EvalError> {
    let app = app.validate()?;
    Ok(error_rates(cm, opts)?.risk(&app))
}

/// Bayes risk divided by the risk of the best constant decision.
///
/// Values above 1 mean the decisions are worse than ignoring the scores.
pub fn normalized_bayes_risk(
    cm: &ConfusionMatrix,
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> Result<f64, EvalError> {
    let app = app.validate()?;
    Ok(error_rates(cm, opts)?.risk(&app) / app.dummy_risk())
}

/// Normalized DCF of the Bayes decisions `llr > t*` for the application's
/// optimal threshold `t*`.
///
/// Only meaningful when the scores are calibrated log-likelihood ratios.
pub fn actual_dcf(
    llr: &[f64],
    labels: &[usize],
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> Result<f64, EvalError> {
    check_binary_input(llr, labels)?;
    let app = app.validate()?;
    let cm = ConfusionMatrix::new(&decide_binary(llr, &app), labels, 2)?;
    normalized_bayes_risk(&cm, &app, opts)
}

/// Result of a threshold sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinDcf {
    /// Lowest normalized DCF over all candidate thresholds.
    pub value: f64,
    /// The lowest threshold attaining it.
    pub threshold: f64,
    pub rates: ErrorRates,
}

/// Minimum normalized DCF over every threshold `{-∞} ∪ scores ∪ {+∞}`.
///
/// Runs in `O(N log N)`; the confusion counts are updated incrementally
/// along the sorted scores.
pub fn min_dcf(
    scores: &[f64],
    labels: &[usize],
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> Result<MinDcf, EvalError> {
    let sweep = ThresholdSweep::new(scores, labels)?;
    min_dcf_from_sweep(&sweep, app, opts)
}

/// [`min_dcf`] over an existing sweep, so several applications can share
/// one sort.
pub fn min_dcf_from_sweep(
    sweep: &ThresholdSweep,
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> Result<MinDcf, EvalError> {
    let app = app.validate()?;
    let opts = opts.validate()?;
    let dummy = app.dummy_risk();

    let mut best: Option<MinDcf> = None;
    for point in sweep.points() {
        let rates = ErrorRates::from_counts(&sweep.counts(point), opts.pseudocount);
        let value = rates.risk(&app) / dummy;
        if best.map_or(true, |b| value < b.value) {
            best = Some(MinDcf {
                value,
                threshold: point.threshold,
                rates,
            });
        }
    }
    if let Some(first) = sweep.points().first() {
        warn_absent_classes(&sweep.counts(first), opts.pseudocount);
    }
    // A sweep always holds at least the two infinite thresholds
    best.ok_or(EvalError::Empty)
}

/// Normalized DCF at the application's optimal threshold, read from a sweep.
pub(crate) fn actual_dcf_from_sweep(
    sweep: &ThresholdSweep,
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> f64 {
    let counts = sweep.counts_at(app.threshold());
    ErrorRates::from_counts(&counts, opts.pseudocount).risk(app) / app.dummy_risk()
}
