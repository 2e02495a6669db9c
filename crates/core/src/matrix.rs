//! Dense linear-algebra primitives.
//!
//! Samples are stored column-wise: a feature matrix is `D × N`, one column
//! per sample. Everything here is a thin layer over `nalgebra` that fixes
//! the conventions used by the rest of the workspace:
//!
//! - means and covariances are maximum-likelihood estimates (divide by N)
//! - log-determinants are computed as sign and magnitude from the LU factors
//! - eigen-decompositions of symmetric matrices come back sorted, largest first

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::CoreError;

/// Reshape a slice into a `D × 1` column matrix.
pub fn vcol(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(values.len(), 1, values)
}

/// Reshape a slice into a `1 × N` row matrix.
pub fn vrow(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_row_slice(1, values.len(), values)
}

/// Subtract `mu` from every column of `x` (column broadcast).
pub fn center(x: &DMatrix<f64>, mu: &DVector<f64>) -> Result<DMatrix<f64>, CoreError> {
    check_rows("center", x, mu.len())?;
    let mut centered = x.clone();
    for mut col in centered.column_iter_mut() {
        col -= mu;
    }
    Ok(centered)
}

/// Sample mean of the columns of `x`.
pub fn mean(x: &DMatrix<f64>) -> Result<DVector<f64>, CoreError> {
    if x.ncols() == 0 {
        return Err(CoreError::Empty { what: "samples" });
    }
    let mut mu = DVector::zeros(x.nrows());
    for col in x.column_iter() {
        mu += col;
    }
    Ok(mu / x.ncols() as f64)
}

/// Maximum-likelihood mean and covariance of the columns of `x`.
///
/// The covariance is normalised by N, not N - 1. A single sample yields a
/// zero (singular) covariance; evaluating a density with it fails later.
pub fn mean_covariance(x: &DMatrix<f64>) -> Result<(DVector<f64>, DMatrix<f64>), CoreError> {
    let mu = mean(x)?;
    let centered = center(x, &mu)?;
    let cov = (&centered * centered.transpose()) / x.ncols() as f64;
    Ok((mu, cov))
}

/// Maximum-likelihood covariance of the columns of `x`.
pub fn covariance(x: &DMatrix<f64>) -> Result<DMatrix<f64>, CoreError> {
    mean_covariance(x).map(|(_, cov)| cov)
}

/// Sign and natural log of the absolute determinant of a square matrix.
///
/// Computed from the diagonal of the LU factor, so it neither overflows nor
/// underflows for badly scaled matrices. A singular matrix gives
/// `(0.0, -inf)`.
pub fn slogdet(m: &DMatrix<f64>) -> Result<(f64, f64), CoreError> {
    check_square("slogdet", m)?;
    let lu = m.clone().lu();
    let mut sign: f64 = lu.p().determinant();
    let mut log_abs = 0.0;
    for &u in lu.u().diagonal().iter() {
        if u == 0.0 {
            return Ok((0.0, f64::NEG_INFINITY));
        }
        if u < 0.0 {
            sign = -sign;
        }
        log_abs += u.abs().ln();
    }
    Ok((sign, log_abs))
}

/// Inverse of a square matrix, failing on singular input.
pub fn inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>, CoreError> {
    check_square("inverse", m)?;
    m.clone()
        .try_inverse()
        .ok_or(CoreError::SingularCovariance {
            sign: 0.0,
            log_abs_det: f64::NEG_INFINITY,
        })
}

/// Eigen-decomposition of a symmetric matrix, eigenvalues in descending order.
///
/// Column `i` of the returned matrix is the eigenvector of eigenvalue `i`.
pub fn symmetric_eigen_desc(
    m: &DMatrix<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>), CoreError> {
    check_square("symmetric_eigen_desc", m)?;
    let eig = SymmetricEigen::new(m.clone());
    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let values = DVector::from_iterator(order.len(), order.iter().map(|&i| eig.eigenvalues[i]));
    let vectors = eig.eigenvectors.select_columns(order.iter());
    Ok((values, vectors))
}

/// Raise every eigenvalue of a symmetric matrix below `floor` up to `floor`.
///
/// The matrix is rebuilt as `U diag(max(s, floor)) Uᵀ`. This bounds the
/// smallest variance along any direction.
pub fn clamp_eigenvalues(m: &DMatrix<f64>, floor: f64) -> Result<DMatrix<f64>, CoreError> {
    if !(floor > 0.0) {
        return Err(CoreError::invalid("floor", "eigenvalue floor must be positive"));
    }
    let (values, vectors) = symmetric_eigen_desc(m)?;
    let clamped = values.map(|s| s.max(floor));
    Ok(&vectors * DMatrix::from_diagonal(&clamped) * vectors.transpose())
}

/// Keep only the diagonal of a square matrix.
pub fn diagonal_only(m: &DMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from_diagonal(&m.diagonal())
}

pub(crate) fn check_rows(
    context: &'static str,
    x: &DMatrix<f64>,
    expected: usize,
) -> Result<(), CoreError> {
    if x.nrows() != expected {
        return Err(CoreError::DimensionMismatch {
            context,
            expected,
            got: x.nrows(),
        });
    }
    Ok(())
}

fn check_square(context: &'static str, m: &DMatrix<f64>) -> Result<(), CoreError> {
    if m.nrows() != m.ncols() {
        return Err(CoreError::DimensionMismatch {
            context,
            expected: m.nrows(),
            got: m.ncols(),
        });
    }
    Ok(())
}
