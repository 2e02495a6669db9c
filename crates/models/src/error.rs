//! Error types for the model crate.

use patrec_core::CoreError;
use patrec_eval::EvalError;
use patrec_optim::OptimError;
use patrec_prob::ProbError;
use thiserror::Error;

/// Errors raised while fitting or applying a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Prob(#[from] ProbError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Optim(#[from] OptimError),

    /// Two operands disagree on a dimension.
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// A binary model was given a label other than 0 or 1.
    #[error("Label {label} is not binary")]
    NotBinaryLabel { label: usize },

    /// Training data holds no sample of a class the model needs.
    #[error("No training samples of class {class}")]
    MissingClass { class: usize },

    /// Requested more output dimensions than the data supports.
    #[error("Cannot keep {requested} dimensions, at most {available} available")]
    TooManyDimensions { requested: usize, available: usize },

    /// A hyperparameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ModelError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
