//! # Error Types
//!
//! Errors in the core crate are precondition violations: a caller handed
//! over matrices that cannot be combined, a covariance that cannot be
//! inverted, or a labelling that leaves a class without samples.
//!
//! None of these are recovered internally. A singular covariance in
//! particular is reported, never patched with a ridge term.

use thiserror::Error;

/// Core errors for the pattern-recognition workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Two operands disagree on a dimension.
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// The covariance matrix has no inverse or a non-positive determinant.
    #[error("Covariance matrix is singular (sign = {sign}, log|det| = {log_abs_det})")]
    SingularCovariance { sign: f64, log_abs_det: f64 },

    /// An operation received no samples at all.
    #[error("Empty input: {what}")]
    Empty { what: &'static str },

    /// A class index has no samples in the label vector.
    #[error("Class {class} has no samples")]
    EmptyClass { class: usize },

    /// A label is outside `0..n_classes`.
    #[error("Label {label} out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    /// A scalar parameter is outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl CoreError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        CoreError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
