//! Misclassification costs and binary application descriptors.
//!
//! A cost matrix `C` is indexed `[predicted, actual]`: `C[i, j]` is the cost
//! paid for deciding class `i` when the sample belongs to class `j`. The same
//! row-is-prediction convention is used by the confusion matrices in the
//! evaluation crate, so the two can be combined entry by entry.
//!
//! A binary application `(π₁, Cfn, Cfp)` is the special case
//!
//! ```text
//! C = | 0    Cfn |      priors = [1 - π₁, π₁]
//!     | Cfp  0   |
//! ```
//!
//! and is fully summarised by its effective prior
//! `π̃ = π₁·Cfn / (π₁·Cfn + (1 - π₁)·Cfp)`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::ProbError;
use crate::priors::Priors;

/// A `K × K` misclassification cost matrix, rows indexed by predicted class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrix {
    costs: DMatrix<f64>,
}

impl CostMatrix {
    /// Wrap a square, non-negative cost matrix.
    pub fn new(costs: DMatrix<f64>) -> Result<Self, ProbError> {
        if costs.nrows() == 0 {
            return Err(ProbError::EmptyDistribution);
        }
        if costs.nrows() != costs.ncols() {
            return Err(ProbError::ShapeMismatch {
                expected: costs.nrows(),
                got: costs.ncols(),
            });
        }
        if costs.iter().any(|&c| c < 0.0 || !c.is_finite()) {
            return Err(ProbError::invalid(
                "costs",
                "entries must be finite and non-negative",
            ));
        }
        Ok(Self { costs })
    }

    /// Build from rows: `rows[i][j]` is the cost of predicting `i` for actual `j`.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ProbError> {
        let k = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != k) {
            return Err(ProbError::ShapeMismatch {
                expected: k,
                got: bad.len(),
            });
        }
        Self::new(DMatrix::from_fn(k, k, |i, j| rows[i][j]))
    }

    /// The 0/1 loss: every error costs 1, correct decisions cost 0.
    pub fn zero_one(k: usize) -> Result<Self, ProbError> {
        Self::new(DMatrix::from_fn(k, k, |i, j| if i == j { 0.0 } else { 1.0 }))
    }

    pub fn n_classes(&self) -> usize {
        self.costs.nrows()
    }

    /// Cost of predicting `predicted` for a sample of class `actual`.
    pub fn get(&self, predicted: usize, actual: usize) -> f64 {
        self.costs[(predicted, actual)]
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.costs
    }

    /// Expected cost of each decision under the priors alone: `C · π`.
    ///
    /// The smallest entry is the risk of the best classifier that ignores
    /// its input and always answers the same class.
    pub fn prior_expected_costs(&self, priors: &Priors) -> Result<DVector<f64>, ProbError> {
        if priors.len() != self.n_classes() {
            return Err(ProbError::ShapeMismatch {
                expected: self.n_classes(),
                got: priors.len(),
            });
        }
        Ok(&self.costs * priors.to_vector())
    }

    /// Bayes cost of every decision for every sample: `C · P` for a `K × N`
    /// posterior matrix `P`.
    pub fn expected_costs(&self, posteriors: &DMatrix<f64>) -> Result<DMatrix<f64>, ProbError> {
        if posteriors.nrows() != self.n_classes() {
            return Err(ProbError::ShapeMismatch {
                expected: self.n_classes(),
                got: posteriors.nrows(),
            });
        }
        Ok(&self.costs * posteriors)
    }
}

/// A binary application: target prior and the two error costs.
///
/// Class 1 is the target (positive) class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryApplication {
    /// Prior π₁ of the target class.
    pub prior: f64,
    /// Cost of a false negative (target rejected).
    pub cfn: f64,
    /// Cost of a false positive (non-target accepted).
    pub cfp: f64,
}

impl Default for BinaryApplication {
    fn default() -> Self {
        Self {
            prior: 0.5,
            cfn: 1.0,
            cfp: 1.0,
        }
    }
}

impl BinaryApplication {
    /// Validated constructor: `0 < π₁ < 1` and both costs strictly positive.
    pub fn new(prior: f64, cfn: f64, cfp: f64) -> Result<Self, ProbError> {
        Self { prior, cfn, cfp }.validate()
    }

    /// An application with unit costs and the given effective prior.
    pub fn with_effective_prior(prior: f64) -> Result<Self, ProbError> {
        Self::new(prior, 1.0, 1.0)
    }

    pub fn with_prior(mut self, prior: f64) -> Self {
        self.prior = prior;
        self
    }

    pub fn with_costs(mut self, cfn: f64, cfp: f64) -> Self {
        self.cfn = cfn;
        self.cfp = cfp;
        self
    }

    /// Check the invariants; returns the application unchanged on success.
    pub fn validate(self) -> Result<Self, ProbError> {
        if !(self.prior > 0.0 && self.prior < 1.0) {
            return Err(ProbError::invalid(
                "prior",
                format!("{} is not in (0, 1)", self.prior),
            ));
        }
        if !(self.cfn > 0.0 && self.cfn.is_finite()) {
            return Err(ProbError::invalid("cfn", "cost must be positive and finite"));
        }
        if !(self.cfp > 0.0 && self.cfp.is_finite()) {
            return Err(ProbError::invalid("cfp", "cost must be positive and finite"));
        }
        Ok(self)
    }

    /// `π̃ = π₁·Cfn / (π₁·Cfn + (1 - π₁)·Cfp)`.
    pub fn effective_prior(&self) -> f64 {
        let t = self.prior * self.cfn;
        t / (t + (1.0 - self.prior) * self.cfp)
    }

    /// Bayes-optimal LLR threshold `-ln(π₁·Cfn / ((1 - π₁)·Cfp))`.
    ///
    /// Samples with `llr > threshold` are assigned to class 1.
    pub fn threshold(&self) -> f64 {
        -((self.prior * self.cfn) / ((1.0 - self.prior) * self.cfp)).ln()
    }

    /// Risk of the best constant decision: `min(π₁·Cfn, (1 - π₁)·Cfp)`.
    pub fn dummy_risk(&self) -> f64 {
        (self.prior * self.cfn).min((1.0 - self.prior) * self.cfp)
    }

    /// `[1 - π₁, π₁]`.
    pub fn priors(&self) -> Result<Priors, ProbError> {
        Priors::binary(self.prior)
    }

    /// `[[0, Cfn], [Cfp, 0]]` in the predicted-row convention.
    pub fn cost_matrix(&self) -> Result<CostMatrix, ProbError> {
        CostMatrix::from_rows(&[vec![0.0, self.cfn], vec![self.cfp, 0.0]])
    }
}

/// Prior log-odds `ln(π / (1 - π))`.
pub fn prior_log_odds(prior: f64) -> f64 {
    (prior / (1.0 - prior)).ln()
}

/// Effective prior for prior log-odds `p`: `1 / (1 + e^{-p})`.
pub fn effective_prior_from_log_odds(log_odds: f64) -> f64 {
    patrec_core::special::sigmoid(log_odds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_prior_collapses_costs() {
        let app = BinaryApplication::new(0.5, 9.0, 1.0).unwrap();
        assert!((app.effective_prior() - 0.9).abs() < 1e-12);

        let app = BinaryApplication::new(0.5, 1.0, 9.0).unwrap();
        assert!((app.effective_prior() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_zero_for_balanced_application() {
        let app = BinaryApplication::default();
        assert!(app.threshold().abs() < 1e-12);
    }

    #[test]
    fn test_threshold_matches_effective_prior() {
        let app = BinaryApplication::new(0.3, 2.0, 5.0).unwrap();
        let eff = BinaryApplication::with_effective_prior(app.effective_prior()).unwrap();
        assert!((app.threshold() - eff.threshold()).abs() < 1e-12);
        assert!((app.threshold() + prior_log_odds(app.effective_prior())).abs() < 1e-12);
    }

    #[test]
    fn test_log_odds_round_trip() {
        for p in [0.1, 0.5, 0.9] {
            assert!((effective_prior_from_log_odds(prior_log_odds(p)) - p).abs() < 1e-12);
        }
    }

    #[test]
    fn test_application_validation() {
        assert!(BinaryApplication::new(0.0, 1.0, 1.0).is_err());
        assert!(BinaryApplication::new(1.0, 1.0, 1.0).is_err());
        assert!(BinaryApplication::new(0.5, 0.0, 1.0).is_err());
        assert!(BinaryApplication::new(0.5, 1.0, -1.0).is_err());
    }

    #[test]
    fn test_binary_cost_matrix_layout() {
        let app = BinaryApplication::new(0.5, 10.0, 1.0).unwrap();
        let c = app.cost_matrix().unwrap();
        // predicted 0, actual 1: a missed target
        assert_eq!(c.get(0, 1), 10.0);
        assert_eq!(c.get(1, 0), 1.0);
        assert_eq!(c.get(0, 0), 0.0);
    }

    #[test]
    fn test_dummy_risk_is_min_prior_expected_cost() {
        let app = BinaryApplication::new(0.2, 3.0, 1.0).unwrap();
        let c = app.cost_matrix().unwrap();
        let expected = c.prior_expected_costs(&app.priors().unwrap()).unwrap();
        assert!((expected.min() - app.dummy_risk()).abs() < 1e-12);
    }

    #[test]
    fn test_cost_matrix_rejects_bad_input() {
        assert!(CostMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0]]).is_err());
        assert!(CostMatrix::from_rows(&[vec![0.0, -1.0], vec![1.0, 0.0]]).is_err());
        assert!(CostMatrix::new(DMatrix::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_zero_one() {
        let c = CostMatrix::zero_one(3).unwrap();
        assert_eq!(c.n_classes(), 3);
        assert_eq!(c.get(1, 1), 0.0);
        assert_eq!(c.get(2, 0), 1.0);
    }
}
