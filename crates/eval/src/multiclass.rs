//! Bayes risk for K-class decisions under a full cost matrix.

use nalgebra::DMatrix;
use patrec_prob::{classify, CostMatrix, Priors};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::confusion::ConfusionMatrix;
use crate::error::EvalError;

/// Empirical risk of a set of decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MulticlassRisk {
    /// `Σ_j π_j Σ_i R[i, j]·C[i, j]` with `R[i, j] = M[i, j] / Σ_i M[i, j]`.
    pub risk: f64,
    /// `risk / min_j (C·π)_j`.
    pub normalized: f64,
}

/// Decisions, confusion matrix and risk for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassEvaluation {
    pub decisions: Vec<usize>,
    pub confusion: ConfusionMatrix,
    pub risk: MulticlassRisk,
}

/// Risk of the decisions summarized by `cm`.
///
/// A class with no samples contributes nothing; this is logged.
pub fn multiclass_risk(
    cm: &ConfusionMatrix,
    priors: &Priors,
    costs: &CostMatrix,
) -> Result<MulticlassRisk, EvalError> {
    let k = cm.n_classes();
    for got in [priors.len(), costs.n_classes()] {
        if got != k {
            return Err(EvalError::LengthMismatch { expected: k, got });
        }
    }

    let actual = cm.actual_totals();
    let mut risk = 0.0;
    for (j, &n_j) in actual.iter().enumerate() {
        if n_j == 0 {
            warn!(class = j, "class absent from labels, contributes zero risk");
            continue;
        }
        let column: f64 = (0..k)
            .map(|i| cm.get(i, j) as f64 / n_j as f64 * costs.get(i, j))
            .sum();
        risk += priors.get(j) * column;
    }

    let dummy = costs.prior_expected_costs(priors)?.min();
    if dummy <= 0.0 {
        return Err(EvalError::InvalidParameter {
            name: "costs".into(),
            reason: "a constant decision has zero expected cost".into(),
        });
    }
    Ok(MulticlassRisk {
        risk,
        normalized: risk / dummy,
    })
}

/// Minimum-expected-cost decisions from `K × N` log-likelihoods, scored
/// against `labels`.
pub fn multiclass_dcf(
    log_likelihoods: &DMatrix<f64>,
    labels: &[usize],
    priors: &Priors,
    costs: &CostMatrix,
) -> Result<MulticlassEvaluation, EvalError> {
    if log_likelihoods.ncols() != labels.len() {
        return Err(EvalError::LengthMismatch {
            expected: labels.len(),
            got: log_likelihoods.ncols(),
        });
    }
    let decisions = classify(log_likelihoods, priors, Some(costs))?;
    let confusion = ConfusionMatrix::new(&decisions, labels, log_likelihoods.nrows())?;
    let risk = multiclass_risk(&confusion, priors, costs)?;
    Ok(MulticlassEvaluation {
        decisions,
        confusion,
        risk,
    })
}
