//! # Core - Statistical Pattern Recognition Foundations
//!
//! This crate provides the building blocks shared by every estimator in the
//! workspace:
//!
//! - **Matrix primitives**: reshape helpers, ML mean/covariance, stable
//!   log-determinant, sorted symmetric eigen-decomposition, eigenvalue flooring
//! - **Special functions**: log-sum-exp, `ln(1 + eˣ)`, sigmoid
//! - **Datasets**: `D × N` feature matrices with a label vector
//! - **Gaussian density**: log-density of many samples under N(μ, Σ)
//! - **Errors**: precondition violations as a single enum
//!
//! ## Conventions
//!
//! Samples are columns. A feature matrix has shape `D × N`, a mean has
//! length D, a covariance is `D × D`, and per-class score matrices are
//! `K × N`.

pub mod dataset;
pub mod error;
pub mod gaussian;
pub mod matrix;
pub mod special;

// Re-export key types at crate root for convenience
pub use dataset::Dataset;
pub use error::CoreError;
pub use gaussian::GaussianDensity;
pub use matrix::{mean_covariance, vcol, vrow};
pub use special::log_sum_exp;
