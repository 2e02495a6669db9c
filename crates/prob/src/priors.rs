//! Class prior probabilities.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A prior distribution over the classes {0, 1, ..., K-1}.
///
/// Invariants:
/// - All probabilities are non-negative
/// - Probabilities sum to 1 (within tolerance)
///
/// # Example
///
/// ```rust
/// use patrec_prob::Priors;
///
/// // Balanced binary application
/// let flat = Priors::uniform(2).unwrap();
/// assert!((flat.get(0) - 0.5).abs() < 1e-12);
///
/// // Target prior π₁ = 0.1 gives [0.9, 0.1]
/// let rare = Priors::binary(0.1).unwrap();
/// assert!((rare.get(0) - 0.9).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Priors {
    p: Vec<f64>,
}

impl Priors {
    /// Create priors from a probability vector.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The vector is empty
    /// - Any probability is negative
    /// - The probabilities don't sum to 1 (within tolerance)
    pub fn new(p: Vec<f64>) -> Result<Self, ProbError> {
        if p.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }
        if p.iter().any(|&x| x < 0.0 || x.is_nan()) {
            return Err(ProbError::NegativeProbability);
        }
        let sum: f64 = p.iter().sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ProbError::NotNormalized { sum });
        }
        Ok(Self { p })
    }

    /// Create priors from unnormalized non-negative weights.
    ///
    /// ```rust
    /// use patrec_prob::Priors;
    ///
    /// let p = Priors::from_weights(vec![1.0, 3.0]).unwrap();
    /// assert!((p.get(1) - 0.75).abs() < 1e-12);
    /// ```
    pub fn from_weights(weights: Vec<f64>) -> Result<Self, ProbError> {
        if weights.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }
        if weights.iter().any(|&x| x < 0.0 || x.is_nan()) {
            return Err(ProbError::NegativeProbability);
        }
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            return Err(ProbError::ZeroWeights);
        }
        Ok(Self {
            p: weights.iter().map(|w| w / sum).collect(),
        })
    }

    /// Uniform priors over `k` classes.
    pub fn uniform(k: usize) -> Result<Self, ProbError> {
        if k == 0 {
            return Err(ProbError::EmptyDistribution);
        }
        Ok(Self {
            p: vec![1.0 / k as f64; k],
        })
    }

    /// Binary priors `[1 - π₁, π₁]` for a target-class prior π₁.
    pub fn binary(target: f64) -> Result<Self, ProbError> {
        if !(0.0..=1.0).contains(&target) {
            return Err(ProbError::invalid("prior", format!("{target} is not in [0, 1]")));
        }
        Ok(Self {
            p: vec![1.0 - target, target],
        })
    }

    /// Empirical class frequencies of a label vector over `k` classes.
    pub fn empirical(labels: &[usize], k: usize) -> Result<Self, ProbError> {
        let counts = patrec_core::dataset::class_counts(labels, k);
        Self::from_weights(counts.into_iter().map(|c| c as f64).collect())
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Prior of class `i`. Panics if `i` is out of range.
    pub fn get(&self, i: usize) -> f64 {
        self.p[i]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.p
    }

    /// Log-priors, `-inf` for zero-probability classes.
    pub fn log(&self) -> DVector<f64> {
        DVector::from_iterator(self.p.len(), self.p.iter().map(|p| p.ln()))
    }

    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.p)
    }
}

impl TryFrom<Vec<f64>> for Priors {
    type Error = ProbError;

    fn try_from(p: Vec<f64>) -> Result<Self, Self::Error> {
        Priors::new(p)
    }
}

impl From<Priors> for Vec<f64> {
    fn from(priors: Priors) -> Self {
        priors.p
    }
}
