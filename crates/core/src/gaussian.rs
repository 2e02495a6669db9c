//! Multivariate Gaussian log-density engine.
//!
//! For a `D × N` sample matrix X, mean μ and covariance Σ:
//!
//! ```text
//! log N(x | μ, Σ) = -D/2 · ln(2π) - 1/2 · ln|Σ| - 1/2 · (x-μ)ᵀ Σ⁻¹ (x-μ)
//! ```
//!
//! The inverse and log-determinant are computed once per covariance
//! ([`GaussianDensity::new`], O(D³)); each evaluation then costs O(D²N).
//!
//! # Example
//!
//! ```rust
//! use nalgebra::{DMatrix, DVector};
//! use patrec_core::gaussian::GaussianDensity;
//!
//! // Standard bivariate normal
//! let g = GaussianDensity::new(DVector::zeros(2), DMatrix::identity(2, 2)).unwrap();
//! let x = DMatrix::from_column_slice(2, 1, &[0.0, 0.0]);
//! let ll = g.log_pdf(&x).unwrap();
//! assert!((ll[0] + (2.0 * std::f64::consts::PI).ln()).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::matrix::{check_rows, inverse, slogdet};
use crate::CoreError;

/// A Gaussian with its precision matrix and log-determinant precomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianDensity {
    mean: DVector<f64>,
    precision: DMatrix<f64>,
    log_det: f64,
}

impl GaussianDensity {
    /// Prepare a density for repeated evaluation.
    ///
    /// # Errors
    /// - `DimensionMismatch` if Σ is not `D × D` for a length-D mean
    /// - `SingularCovariance` if Σ has no inverse or a non-positive determinant
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self, CoreError> {
        let d = mean.len();
        check_rows("covariance rows", &covariance, d)?;
        if covariance.ncols() != d {
            return Err(CoreError::DimensionMismatch {
                context: "covariance columns",
                expected: d,
                got: covariance.ncols(),
            });
        }

        let (sign, log_abs_det) = slogdet(&covariance)?;
        if sign <= 0.0 || !log_abs_det.is_finite() {
            return Err(CoreError::SingularCovariance { sign, log_abs_det });
        }
        let precision = inverse(&covariance)?;

        Ok(Self {
            mean,
            precision,
            log_det: log_abs_det,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// `ln|Σ|`.
    pub fn log_det(&self) -> f64 {
        self.log_det
    }

    /// One log-density per column of `x`.
    pub fn log_pdf(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, CoreError> {
        check_rows("samples", x, self.dim())?;
        let constant = -0.5 * self.dim() as f64 * (2.0 * PI).ln() - 0.5 * self.log_det;

        let mut out = DVector::zeros(x.ncols());
        let mut diff = DVector::zeros(self.dim());
        for (n, col) in x.column_iter().enumerate() {
            diff.copy_from(&col);
            diff -= &self.mean;
            let quad = diff.dot(&(&self.precision * &diff));
            out[n] = constant - 0.5 * quad;
        }
        Ok(out)
    }

    /// Total log-likelihood of the columns of `x`.
    pub fn log_likelihood(&self, x: &DMatrix<f64>) -> Result<f64, CoreError> {
        Ok(self.log_pdf(x)?.sum())
    }
}

/// Log-density of every column of `x` under N(μ, Σ).
///
/// Convenience wrapper building a one-off [`GaussianDensity`].
pub fn log_pdf(
    x: &DMatrix<f64>,
    mean: &DVector<f64>,
    covariance: &DMatrix<f64>,
) -> Result<DVector<f64>, CoreError> {
    GaussianDensity::new(mean.clone(), covariance.clone())?.log_pdf(x)
}
