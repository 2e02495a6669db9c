//! Error types for probability and decision operations.

use patrec_core::CoreError;
use thiserror::Error;

/// Errors that can occur while estimating models or taking decisions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbError {
    /// A linear-algebra or dataset precondition failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Prior vector doesn't sum to 1.
    #[error("Priors not normalized: sum = {sum} (expected 1.0)")]
    NotNormalized { sum: f64 },

    /// Negative probability or weight encountered.
    #[error("Negative probability encountered")]
    NegativeProbability,

    /// All weights are zero (can't normalize).
    #[error("Cannot normalize: all weights are zero")]
    ZeroWeights,

    /// Empty prior vector or mixture.
    #[error("Distribution cannot be empty")]
    EmptyDistribution,

    /// Shape mismatch between scores, priors and costs.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// A scalar parameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// LBG doubling can only reach 1 or an even number of components.
    #[error("Invalid GMM component count {requested}: must be 1 or an even number >= 2")]
    InvalidComponentCount { requested: usize },

    /// A mixture component received no responsibility mass in the E-step.
    #[error("GMM component {component} collapsed: zero responsibility")]
    DegenerateComponent { component: usize },

    /// A binary-only operation was given another class count.
    #[error("Operation requires 2 classes, got {n_classes}")]
    NotBinary { n_classes: usize },
}

impl ProbError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ProbError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
