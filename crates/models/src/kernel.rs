//! Kernel functions for the dual SVM.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A positive semi-definite kernel `k(x, y)`.
///
/// ```rust
/// use nalgebra::DMatrix;
/// use patrec_models::Kernel;
///
/// let x = DMatrix::from_column_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
/// let k = Kernel::Rbf { gamma: 1.0 }.gram(&x, &x).unwrap();
/// assert_eq!(k[(0, 0)], 1.0);
/// assert!((k[(0, 1)] - (-2.0f64).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    /// `(xᵀy + offset)^degree`.
    Polynomial { degree: u32, offset: f64 },
    /// `exp(-γ·‖x - y‖²)`.
    Rbf { gamma: f64 },
}

impl Kernel {
    pub fn validate(&self) -> Result<(), ModelError> {
        match *self {
            Kernel::Polynomial { degree, offset } => {
                if degree == 0 {
                    return Err(ModelError::invalid("degree", "must be at least 1"));
                }
                if !offset.is_finite() {
                    return Err(ModelError::invalid("offset", "must be finite"));
                }
            }
            Kernel::Rbf { gamma } => {
                if !(gamma > 0.0 && gamma.is_finite()) {
                    return Err(ModelError::invalid("gamma", "must be positive and finite"));
                }
            }
        }
        Ok(())
    }

    /// Kernel between two single samples.
    pub fn evaluate(&self, x: &DVector<f64>, y: &DVector<f64>) -> f64 {
        match *self {
            Kernel::Polynomial { degree, offset } => (x.dot(y) + offset).powi(degree as i32),
            Kernel::Rbf { gamma } => (-gamma * (x - y).norm_squared()).exp(),
        }
    }

    /// `N_a × N_b` matrix of kernel values between the columns of `a` and `b`.
    ///
    /// RBF distances use `‖x‖² + ‖y‖² - 2xᵀy` on the whole Gram matrix,
    /// clamped at zero against rounding.
    pub fn gram(&self, a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
        if a.nrows() != b.nrows() {
            return Err(ModelError::DimensionMismatch {
                context: "kernel operands",
                expected: a.nrows(),
                got: b.nrows(),
            });
        }
        let cross = a.tr_mul(b);
        Ok(match *self {
            Kernel::Polynomial { degree, offset } => {
                cross.map(|v| (v + offset).powi(degree as i32))
            }
            Kernel::Rbf { gamma } => {
                let na: Vec<f64> = a.column_iter().map(|c| c.norm_squared()).collect();
                let nb: Vec<f64> = b.column_iter().map(|c| c.norm_squared()).collect();
                DMatrix::from_fn(a.ncols(), b.ncols(), |i, j| {
                    let d2 = (na[i] + nb[j] - 2.0 * cross[(i, j)]).max(0.0);
                    (-gamma * d2).exp()
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> DMatrix<f64> {
        DMatrix::from_column_slice(3, 4, &[
            1.0, 0.0, -1.0, //
            0.5, 2.0, 0.0, //
            -1.5, 0.3, 0.7, //
            0.0, 0.0, 0.0,
        ])
    }

    #[test]
    fn test_gram_matches_pointwise() {
        let x = samples();
        for kernel in [
            Kernel::Polynomial { degree: 2, offset: 1.0 },
            Kernel::Polynomial { degree: 3, offset: 0.0 },
            Kernel::Rbf { gamma: 0.5 },
        ] {
            let k = kernel.gram(&x, &x).unwrap();
            for i in 0..4 {
                for j in 0..4 {
                    let direct = kernel.evaluate(&x.column(i).into_owned(), &x.column(j).into_owned());
                    assert!((k[(i, j)] - direct).abs() < 1e-12, "{kernel:?} at ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_gram_is_symmetric_with_unit_rbf_diagonal() {
        let x = samples();
        let k = Kernel::Rbf { gamma: 2.0 }.gram(&x, &x).unwrap();
        assert!((&k - k.transpose()).amax() < 1e-12);
        assert!(k.diagonal().iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_rectangular_and_mismatched() {
        let x = samples();
        let y = x.columns(0, 2).into_owned();
        let k = Kernel::Rbf { gamma: 1.0 }.gram(&x, &y).unwrap();
        assert_eq!(k.shape(), (4, 2));
        assert!(Kernel::Rbf { gamma: 1.0 }.gram(&x, &DMatrix::zeros(2, 1)).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(Kernel::Rbf { gamma: 0.0 }.validate().is_err());
        assert!(Kernel::Polynomial { degree: 0, offset: 1.0 }.validate().is_err());
        assert!(Kernel::Polynomial { degree: 2, offset: 1.0 }.validate().is_ok());
    }
}
