//! Principal component analysis.

use nalgebra::{DMatrix, DVector};
use patrec_core::matrix::{center, mean_covariance, symmetric_eigen_desc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::training::check_features;

/// Projection onto the `m` leading eigenvectors of the training covariance.
///
/// ```rust
/// use nalgebra::DMatrix;
/// use patrec_models::Pca;
///
/// // All the spread is along the first axis
/// let x = DMatrix::from_row_slice(2, 4, &[-3.0, -1.0, 1.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
/// let pca = Pca::fit(&x, 1).unwrap();
/// assert!((pca.explained_variance_ratio() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    mean: DVector<f64>,
    /// `D × m`, one principal direction per column.
    directions: DMatrix<f64>,
    /// Every covariance eigenvalue, largest first.
    eigenvalues: DVector<f64>,
}

impl Pca {
    /// Keep `m` components of `D × N` data, `1 ≤ m ≤ D`.
    pub fn fit(x: &DMatrix<f64>, m: usize) -> Result<Self, ModelError> {
        if m == 0 || m > x.nrows() {
            return Err(ModelError::TooManyDimensions {
                requested: m,
                available: x.nrows(),
            });
        }
        let (mean, cov) = mean_covariance(x)?;
        let (eigenvalues, vectors) = symmetric_eigen_desc(&cov)?;
        let directions = vectors.columns(0, m).into_owned();
        let pca = Self {
            mean,
            directions,
            eigenvalues,
        };
        debug!(m, explained = pca.explained_variance_ratio(), "PCA fit");
        Ok(pca)
    }

    /// Number of output dimensions.
    pub fn dim(&self) -> usize {
        self.directions.ncols()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn directions(&self) -> &DMatrix<f64> {
        &self.directions
    }

    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    /// Share of the total variance kept by the retained components.
    pub fn explained_variance_ratio(&self) -> f64 {
        let total: f64 = self.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        if total == 0.0 {
            return 1.0;
        }
        let kept: f64 = self.eigenvalues.rows(0, self.dim()).iter().map(|v| v.max(0.0)).sum();
        kept / total
    }

    /// `Pᵀ(x - μ)` for every column.
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
        check_features("PCA input", x, self.mean.len())?;
        Ok(self.directions.tr_mul(&center(x, &self.mean)?))
    }
}
