//! Error types for evaluation.

use patrec_prob::ProbError;
use thiserror::Error;

/// Errors raised while scoring decisions against ground truth.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Priors, costs or decisions were invalid.
    #[error(transparent)]
    Prob(#[from] ProbError),

    /// Two per-sample vectors differ in length.
    #[error("Length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// A label or prediction is outside `0..n_classes`.
    #[error("Label {label} out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    /// A binary-only metric was given another class count.
    #[error("Metric requires 2 classes, got {n_classes}")]
    NotBinary { n_classes: usize },

    /// No samples to evaluate.
    #[error("Cannot evaluate an empty set of samples")]
    Empty,

    /// A metric needs samples of both classes and one is missing.
    #[error("No samples of class {class}")]
    MissingClass { class: usize },

    /// A score is NaN, so it has no place in a threshold sweep.
    #[error("Score at index {index} is NaN")]
    NanScore { index: usize },

    /// An option is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}
