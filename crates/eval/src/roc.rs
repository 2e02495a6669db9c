//! ROC curves from binary scores.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::sweep::ThresholdSweep;

/// One operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// Operating points for thresholds `{-∞} ∪ scores ∪ {+∞}`, running from
/// `(1, 1)` down to `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    points: Vec<RocPoint>,
}

impl RocCurve {
    /// Needs at least one sample of each class.
    pub fn new(scores: &[f64], labels: &[usize]) -> Result<Self, EvalError> {
        Self::from_sweep(&ThresholdSweep::new(scores, labels)?)
    }

    pub fn from_sweep(sweep: &ThresholdSweep) -> Result<Self, EvalError> {
        let n0 = sweep.n_non_targets();
        let n1 = sweep.n_targets();
        if n0 == 0 {
            return Err(EvalError::MissingClass { class: 0 });
        }
        if n1 == 0 {
            return Err(EvalError::MissingClass { class: 1 });
        }
        let points = sweep
            .points()
            .iter()
            .map(|p| RocPoint {
                threshold: p.threshold,
                false_positive_rate: p.false_positives as f64 / n0 as f64,
                true_positive_rate: (n1 - p.false_negatives) as f64 / n1 as f64,
            })
            .collect();
        Ok(Self { points })
    }

    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    /// Area under the curve by the trapezoid rule.
    ///
    /// Tied scores produce a diagonal segment, so ties count one half.
    pub fn auc(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| {
                let width = w[0].false_positive_rate - w[1].false_positive_rate;
                width * 0.5 * (w[0].true_positive_rate + w[1].true_positive_rate)
            })
            .sum()
    }

    /// Equal error rate: where the miss rate `1 - TPR` meets the FPR,
    /// linearly interpolated between operating points.
    pub fn equal_error_rate(&self) -> f64 {
        for w in self.points.windows(2) {
            let d0 = w[0].false_positive_rate - (1.0 - w[0].true_positive_rate);
            let d1 = w[1].false_positive_rate - (1.0 - w[1].true_positive_rate);
            if d0 >= 0.0 && d1 <= 0.0 {
                let t = if d0 == d1 { 0.0 } else { d0 / (d0 - d1) };
                return w[0].false_positive_rate
                    + t * (w[1].false_positive_rate - w[0].false_positive_rate);
            }
        }
        // d runs from 1 at -∞ to -1 at +∞, so a crossing always exists
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_and_reversed() {
        let labels = [0, 0, 1, 1];
        let good = RocCurve::new(&[-2.0, -1.0, 1.0, 2.0], &labels).unwrap();
        assert!((good.auc() - 1.0).abs() < 1e-12);
        assert!(good.equal_error_rate().abs() < 1e-12);
        let bad = RocCurve::new(&[2.0, 1.0, -1.0, -2.0], &labels).unwrap();
        assert!(bad.auc().abs() < 1e-12);
    }

    #[test]
    fn test_constant_scores_are_chance() {
        let roc = RocCurve::new(&[0.0; 6], &[0, 1, 0, 1, 1, 0]).unwrap();
        assert!((roc.auc() - 0.5).abs() < 1e-12);
        assert!((roc.equal_error_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_endpoints() {
        let roc = RocCurve::new(&[0.1, 0.4, 0.35, 0.8], &[0, 0, 1, 1]).unwrap();
        let first = roc.points()[0];
        let last = roc.points()[roc.points().len() - 1];
        assert_eq!((first.false_positive_rate, first.true_positive_rate), (1.0, 1.0));
        assert_eq!((last.false_positive_rate, last.true_positive_rate), (0.0, 0.0));
        // One discordant pair out of four
        assert!((roc.auc() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_requires_both_classes() {
        assert!(matches!(
            RocCurve::new(&[0.0, 1.0], &[1, 1]),
            Err(EvalError::MissingClass { class: 0 })
        ));
    }
}
