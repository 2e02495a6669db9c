//! Incremental threshold sweep over binary scores.
//!
//! Sorting the scores once lets every candidate threshold's error counts be
//! derived from the previous one: raising the threshold past a score value
//! flips exactly the samples holding that value from class 1 to class 0.
//! minDCF, the ROC curve and the Bayes error plot all read from the same
//! sweep.

use serde::{Deserialize, Serialize};

use crate::confusion::BinaryCounts;
use crate::error::EvalError;

/// Error counts for the rule `score > threshold → class 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub threshold: f64,
    pub false_negatives: usize,
    pub false_positives: usize,
}

/// All candidate thresholds `{-∞} ∪ unique scores ∪ {+∞}` in increasing
/// order, with their error counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSweep {
    n_targets: usize,
    n_non_targets: usize,
    points: Vec<SweepPoint>,
}

impl ThresholdSweep {
    /// Sweep `scores` against binary `labels`.
    ///
    /// Fails on NaN scores, labels other than 0/1, mismatched lengths or no
    /// samples at all.
    pub fn new(scores: &[f64], labels: &[usize]) -> Result<Self, EvalError> {
        check_binary_input(scores, labels)?;

        let n_targets = labels.iter().filter(|&&l| l == 1).count();
        let n_non_targets = labels.len() - n_targets;

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

        // At -∞ everything but a -∞ score is accepted
        let mut false_negatives = 0;
        let mut false_positives = 0;
        for (&s, &l) in scores.iter().zip(labels) {
            match (l, s == f64::NEG_INFINITY) {
                (1, true) => false_negatives += 1,
                (0, false) => false_positives += 1,
                _ => {}
            }
        }
        let mut points = Vec::with_capacity(scores.len() + 2);
        points.push(SweepPoint {
            threshold: f64::NEG_INFINITY,
            false_negatives,
            false_positives,
        });

        let mut i = 0;
        while i < order.len() {
            let value = scores[order[i]];
            let mut j = i;
            while j < order.len() && scores[order[j]] == value {
                if value > f64::NEG_INFINITY {
                    if labels[order[j]] == 1 {
                        false_negatives += 1;
                    } else {
                        false_positives -= 1;
                    }
                }
                j += 1;
            }
            if value > f64::NEG_INFINITY {
                points.push(SweepPoint {
                    threshold: value,
                    false_negatives,
                    false_positives,
                });
            }
            i = j;
        }

        if points.last().map(|p| p.threshold) != Some(f64::INFINITY) {
            points.push(SweepPoint {
                threshold: f64::INFINITY,
                false_negatives: n_targets,
                false_positives: 0,
            });
        }

        Ok(Self {
            n_targets,
            n_non_targets,
            points,
        })
    }

    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    pub fn n_non_targets(&self) -> usize {
        self.n_non_targets
    }

    /// Candidate thresholds in increasing order.
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    /// The binary confusion cells at a sweep point.
    pub fn counts(&self, point: &SweepPoint) -> BinaryCounts {
        BinaryCounts {
            true_negatives: self.n_non_targets - point.false_positives,
            false_negatives: point.false_negatives,
            false_positives: point.false_positives,
            true_positives: self.n_targets - point.false_negatives,
        }
    }

    /// Counts for an arbitrary threshold `t`.
    ///
    /// `score > t` and `score > c` agree for the largest candidate `c ≤ t`,
    /// since no score lies in `(c, t]`.
    pub fn counts_at(&self, threshold: f64) -> BinaryCounts {
        let idx = self
            .points
            .partition_point(|p| p.threshold <= threshold)
            .saturating_sub(1);
        self.counts(&self.points[idx])
    }
}

/// Shared validation for binary score/label pairs.
pub(crate) fn check_binary_input(scores: &[f64], labels: &[usize]) -> Result<(), EvalError> {
    if scores.len() != labels.len() {
        return Err(EvalError::LengthMismatch {
            expected: labels.len(),
            got: scores.len(),
        });
    }
    if scores.is_empty() {
        return Err(EvalError::Empty);
    }
    if let Some(index) = scores.iter().position(|s| s.is_nan()) {
        return Err(EvalError::NanScore { index });
    }
    if let Some(&label) = labels.iter().find(|&&l| l > 1) {
        return Err(EvalError::LabelOutOfRange {
            label,
            n_classes: 2,
        });
    }
    Ok(())
}
