//! Confusion matrices indexed `[predicted, actual]`.

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A `K × K` count matrix; entry `[p, a]` counts samples predicted as `p`
/// whose true class is `a`.
///
/// Row sums are predicted-class totals, column sums are actual-class totals,
/// and all entries sum to the number of evaluated samples.
///
/// ```rust
/// use patrec_eval::ConfusionMatrix;
///
/// let cm = ConfusionMatrix::new(&[0, 1, 1, 0], &[0, 1, 0, 0], 2).unwrap();
/// assert_eq!(cm.get(1, 0), 1); // one false positive
/// assert_eq!(cm.total(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<usize>,
}

/// The four cells of a binary confusion matrix, class 1 being the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinaryCounts {
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
    pub true_positives: usize,
}

impl BinaryCounts {
    /// Number of actual targets, `TP + FN`.
    pub fn n_targets(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    /// Number of actual non-targets, `TN + FP`.
    pub fn n_non_targets(&self) -> usize {
        self.true_negatives + self.false_positives
    }
}

impl ConfusionMatrix {
    /// Count `(predicted, actual)` pairs over `n_classes` classes.
    pub fn new(predicted: &[usize], actual: &[usize], n_classes: usize) -> Result<Self, EvalError> {
        if predicted.len() != actual.len() {
            return Err(EvalError::LengthMismatch {
                expected: actual.len(),
                got: predicted.len(),
            });
        }
        let mut counts = vec![0; n_classes * n_classes];
        for (&p, &a) in predicted.iter().zip(actual) {
            let label = p.max(a);
            if label >= n_classes {
                return Err(EvalError::LabelOutOfRange { label, n_classes });
            }
            counts[p * n_classes + a] += 1;
        }
        Ok(Self { n_classes, counts })
    }

    /// Like [`new`](Self::new) with the class count inferred from the
    /// largest label seen.
    pub fn from_labels(predicted: &[usize], actual: &[usize]) -> Result<Self, EvalError> {
        let n_classes = predicted
            .iter()
            .chain(actual)
            .max()
            .map_or(0, |&m| m + 1);
        if n_classes == 0 {
            return Err(EvalError::Empty);
        }
        Self::new(predicted, actual, n_classes)
    }

    /// Build a binary matrix directly from its cells.
    pub fn from_binary(counts: BinaryCounts) -> Self {
        Self {
            n_classes: 2,
            counts: vec![
                counts.true_negatives,
                counts.false_negatives,
                counts.false_positives,
                counts.true_positives,
            ],
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Count of samples predicted `predicted` with true class `actual`.
    pub fn get(&self, predicted: usize, actual: usize) -> usize {
        self.counts[predicted * self.n_classes + actual]
    }

    /// Number of samples counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Row sums: how many samples were assigned to each class.
    pub fn predicted_totals(&self) -> Vec<usize> {
        (0..self.n_classes)
            .map(|p| (0..self.n_classes).map(|a| self.get(p, a)).sum())
            .collect()
    }

    /// Column sums: how many samples truly belong to each class.
    pub fn actual_totals(&self) -> Vec<usize> {
        (0..self.n_classes)
            .map(|a| (0..self.n_classes).map(|p| self.get(p, a)).sum())
            .collect()
    }

    /// Number of samples on the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|k| self.get(k, k)).sum()
    }

    /// Fraction of misclassified samples.
    pub fn error_rate(&self) -> Result<f64, EvalError> {
        let total = self.total();
        if total == 0 {
            return Err(EvalError::Empty);
        }
        Ok((total - self.correct()) as f64 / total as f64)
    }

    /// The four binary cells; fails unless K = 2.
    pub fn binary(&self) -> Result<BinaryCounts, EvalError> {
        if self.n_classes != 2 {
            return Err(EvalError::NotBinary {
                n_classes: self.n_classes,
            });
        }
        Ok(BinaryCounts {
            true_negatives: self.get(0, 0),
            false_negatives: self.get(0, 1),
            false_positives: self.get(1, 0),
            true_positives: self.get(1, 1),
        })
    }

    /// The counts as a real matrix, for cost arithmetic.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_classes, self.n_classes, |p, a| self.get(p, a) as f64)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        for p in 0..self.n_classes {
            let row: Vec<String> = (0..self.n_classes)
                .map(|a| format!("{:>width$}", self.get(p, a)))
                .collect();
            writeln!(f, "[{}]", row.join(" "))?;
        }
        Ok(())
    }
}

/// Fraction of positions where `predicted` and `actual` differ.
pub fn error_rate(predicted: &[usize], actual: &[usize]) -> Result<f64, EvalError> {
    if predicted.len() != actual.len() {
        return Err(EvalError::LengthMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(EvalError::Empty);
    }
    let wrong = predicted.iter().zip(actual).filter(|(p, a)| p != a).count();
    Ok(wrong as f64 / actual.len() as f64)
}

/// Confusion matrix of the decisions `score > threshold` against binary
/// labels.
pub fn binary_confusion(
    scores: &[f64],
    labels: &[usize],
    threshold: f64,
) -> Result<ConfusionMatrix, EvalError> {
    let predicted = patrec_prob::decide_threshold(scores, threshold);
    ConfusionMatrix::new(&predicted, labels, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicted_rows_actual_columns() {
        let cm = ConfusionMatrix::new(&[0, 1, 1, 0], &[0, 1, 0, 0], 2).unwrap();
        // Sample 2 is predicted 1 but is actually 0
        assert_eq!(cm.get(0, 0), 2);
        assert_eq!(cm.get(0, 1), 0);
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(cm.to_matrix(), DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 1.0, 1.0]));
    }

    #[test]
    fn test_totals() {
        let cm = ConfusionMatrix::new(&[0, 2, 1, 2, 2], &[0, 1, 1, 2, 0], 3).unwrap();
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.predicted_totals(), vec![1, 1, 3]);
        assert_eq!(cm.actual_totals(), vec![2, 2, 1]);
        assert_eq!(cm.correct(), 3);
        assert!((cm.error_rate().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_binary_cells() {
        let cm = ConfusionMatrix::new(&[0, 1, 1, 0, 0], &[0, 1, 0, 1, 1], 2).unwrap();
        let b = cm.binary().unwrap();
        assert_eq!(b.true_negatives, 1);
        assert_eq!(b.false_positives, 1);
        assert_eq!(b.false_negatives, 2);
        assert_eq!(b.true_positives, 1);
        assert_eq!(b.n_targets(), 3);
        assert_eq!(b.n_non_targets(), 2);
        assert_eq!(ConfusionMatrix::from_binary(b), cm);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            ConfusionMatrix::new(&[0, 1], &[0], 2),
            Err(EvalError::LengthMismatch { .. })
        ));
        assert!(matches!(
            ConfusionMatrix::new(&[0, 3], &[0, 1], 2),
            Err(EvalError::LabelOutOfRange { label: 3, n_classes: 2 })
        ));
        let three = ConfusionMatrix::new(&[0, 2], &[0, 1], 3).unwrap();
        assert!(matches!(three.binary(), Err(EvalError::NotBinary { n_classes: 3 })));
    }

    #[test]
    fn test_inferred_class_count() {
        let cm = ConfusionMatrix::from_labels(&[0, 2], &[1, 1]).unwrap();
        assert_eq!(cm.n_classes(), 3);
        assert!(matches!(ConfusionMatrix::from_labels(&[], &[]), Err(EvalError::Empty)));
    }

    #[test]
    fn test_display() {
        let cm = ConfusionMatrix::new(&[0, 1, 1, 0], &[0, 1, 0, 0], 2).unwrap();
        assert_eq!(cm.to_string(), "[2 0]\n[1 1]\n");
    }

    #[test]
    fn test_error_rate_and_threshold_confusion() {
        assert!((error_rate(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap() - 0.25).abs() < 1e-12);
        let cm = binary_confusion(&[-1.0, 0.5, 2.0], &[0, 0, 1], 0.0).unwrap();
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(1, 1), 1);
    }
}
