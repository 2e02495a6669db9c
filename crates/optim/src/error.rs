//! Error types for the optimizer.

use thiserror::Error;

/// Errors raised before or during a minimization.
///
/// Running out of iterations is not an error; it is reported through
/// [`Termination`](crate::Termination) on the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimError {
    /// Starting point, bounds or gradient disagree on the dimension.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A lower bound exceeds its upper bound.
    #[error("Invalid bounds at index {index}: lower {lower} > upper {upper}")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },

    /// The objective is not finite at the starting point.
    #[error("Objective is not finite at the starting point (value = {value})")]
    NonFiniteStart { value: f64 },

    /// An option is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}
