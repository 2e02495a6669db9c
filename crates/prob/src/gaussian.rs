//! Maximum-likelihood Gaussian class models.
//!
//! Three covariance structures are supported, selected per fit with
//! [`CovarianceModel`]:
//!
//! - **Full** (MVG): each class gets its own empirical mean and covariance
//! - **Naive**: per-class covariance restricted to its diagonal, i.e. the
//!   features are assumed independent given the class
//! - **Tied**: one covariance shared by all classes,
//!   `Σ = (1/N) Σ_c N_c · Σ_c`, while means stay per class
//!
//! A class with a single sample has a zero covariance. Estimation still
//! succeeds; evaluating densities with it fails with
//! [`CoreError::SingularCovariance`](patrec_core::CoreError::SingularCovariance).
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use patrec_prob::{CovarianceModel, GaussianClassifier, GenerativeClassifier, Priors};
//!
//! let x = DMatrix::from_row_slice(1, 6, &[-1.2, -0.8, -1.0, 2.9, 3.1, 3.3]);
//! let labels = vec![0, 0, 0, 1, 1, 1];
//! let clf = GaussianClassifier::fit(&x, &labels, 2, CovarianceModel::Tied).unwrap();
//!
//! let probe = DMatrix::from_row_slice(1, 2, &[-1.0, 3.0]);
//! let labels = clf.predict(&probe, &Priors::uniform(2).unwrap()).unwrap();
//! assert_eq!(labels, vec![0, 1]);
//! ```

use nalgebra::{DMatrix, DVector};
use patrec_core::dataset::{check_labels, class_counts, partition_by_class};
use patrec_core::gaussian::GaussianDensity;
use patrec_core::matrix::{diagonal_only, mean_covariance};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProbError;
use crate::inference::GenerativeClassifier;

/// Covariance structure of a Gaussian class model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CovarianceModel {
    /// Unconstrained per-class covariance.
    #[default]
    Full,
    /// Per-class diagonal covariance.
    Naive,
    /// A single covariance shared by every class.
    Tied,
}

/// Mean and covariance of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGaussian {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

impl ClassGaussian {
    /// Precompute the density for repeated evaluation.
    pub fn density(&self) -> Result<GaussianDensity, ProbError> {
        Ok(GaussianDensity::new(
            self.mean.clone(),
            self.covariance.clone(),
        )?)
    }
}

/// ML estimates of one Gaussian per class under the chosen structure.
///
/// Every class in `0..n_classes` must have at least one sample.
pub fn estimate_class_gaussians(
    x: &DMatrix<f64>,
    labels: &[usize],
    n_classes: usize,
    model: CovarianceModel,
) -> Result<Vec<ClassGaussian>, ProbError> {
    check_labels(labels, x.ncols(), n_classes)?;
    let parts = partition_by_class(x, labels, n_classes)?;

    let mut classes = parts
        .iter()
        .map(|part| {
            let (mean, covariance) = mean_covariance(part)?;
            Ok(ClassGaussian { mean, covariance })
        })
        .collect::<Result<Vec<_>, ProbError>>()?;

    match model {
        CovarianceModel::Full => {}
        CovarianceModel::Naive => {
            for c in &mut classes {
                c.covariance = diagonal_only(&c.covariance);
            }
        }
        CovarianceModel::Tied => {
            let shared = tied_covariance(&classes, &class_counts(labels, n_classes));
            for c in &mut classes {
                c.covariance = shared.clone();
            }
        }
    }
    Ok(classes)
}

/// Sample-size weighted average of per-class covariances.
pub fn tied_covariance(classes: &[ClassGaussian], counts: &[usize]) -> DMatrix<f64> {
    let d = classes.first().map_or(0, |c| c.mean.len());
    let total: usize = counts.iter().sum();
    let mut shared = DMatrix::zeros(d, d);
    for (c, &n) in classes.iter().zip(counts) {
        shared += &c.covariance * n as f64;
    }
    shared / total.max(1) as f64
}

/// A generative classifier with one Gaussian per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianClassifier {
    model: CovarianceModel,
    classes: Vec<ClassGaussian>,
}

impl GaussianClassifier {
    /// Estimate the class Gaussians from a labelled `D × N` matrix.
    pub fn fit(
        x: &DMatrix<f64>,
        labels: &[usize],
        n_classes: usize,
        model: CovarianceModel,
    ) -> Result<Self, ProbError> {
        let classes = estimate_class_gaussians(x, labels, n_classes, model)?;
        debug!(?model, n_classes, dim = x.nrows(), "fitted Gaussian classifier");
        Ok(Self { model, classes })
    }

    /// Build from known parameters.
    pub fn from_parameters(
        model: CovarianceModel,
        classes: Vec<ClassGaussian>,
    ) -> Result<Self, ProbError> {
        if classes.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }
        Ok(Self { model, classes })
    }

    pub fn model(&self) -> CovarianceModel {
        self.model
    }

    pub fn classes(&self) -> &[ClassGaussian] {
        &self.classes
    }
}

impl GenerativeClassifier for GaussianClassifier {
    fn n_classes(&self) -> usize {
        self.classes.len()
    }

    fn log_likelihoods(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ProbError> {
        let mut scores = DMatrix::zeros(self.classes.len(), x.ncols());
        for (k, class) in self.classes.iter().enumerate() {
            let ll = class.density()?.log_pdf(x)?;
            scores.row_mut(k).copy_from(&ll.transpose());
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priors::Priors;
    use patrec_core::CoreError;

    fn two_blobs() -> (DMatrix<f64>, Vec<usize>) {
        let x = DMatrix::from_column_slice(2, 6, &[
            0.0, 0.0, 1.0, 0.5, -1.0, -0.5, //
            5.0, 5.0, 6.0, 4.0, 4.0, 6.5,
        ]);
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_full_estimates_per_class() {
        let (x, labels) = two_blobs();
        let classes = estimate_class_gaussians(&x, &labels, 2, CovarianceModel::Full).unwrap();
        assert_eq!(classes.len(), 2);
        assert!(classes[0].mean[0].abs() < 1e-12);
        assert!((classes[1].mean[0] - 5.0).abs() < 1e-12);
        // Class 0 is perfectly correlated
        assert!((classes[0].covariance[(0, 1)] - classes[0].covariance[(0, 0)] / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_naive_drops_off_diagonal() {
        let (x, labels) = two_blobs();
        let full = estimate_class_gaussians(&x, &labels, 2, CovarianceModel::Full).unwrap();
        let naive = estimate_class_gaussians(&x, &labels, 2, CovarianceModel::Naive).unwrap();
        for (f, n) in full.iter().zip(&naive) {
            assert_eq!(n.covariance[(0, 1)], 0.0);
            assert_eq!(n.covariance[(1, 0)], 0.0);
            assert_eq!(n.covariance[(0, 0)], f.covariance[(0, 0)]);
            assert_eq!(f.mean, n.mean);
        }
    }

    #[test]
    fn test_tied_is_weighted_average() {
        let x = DMatrix::from_row_slice(1, 5, &[0.0, 2.0, 10.0, 11.0, 12.0]);
        let labels = vec![0, 0, 1, 1, 1];
        let tied = estimate_class_gaussians(&x, &labels, 2, CovarianceModel::Tied).unwrap();
        // Class variances: 1 (n = 2) and 2/3 (n = 3) → (2·1 + 3·2/3) / 5
        let expected = (2.0 * 1.0 + 3.0 * (2.0 / 3.0)) / 5.0;
        assert!((tied[0].covariance[(0, 0)] - expected).abs() < 1e-12);
        assert_eq!(tied[0].covariance, tied[1].covariance);
        assert!((tied[1].mean[0] - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_class_fails_at_evaluation() {
        let x = DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 7.0]);
        let clf = GaussianClassifier::fit(&x, &[0, 0, 1], 2, CovarianceModel::Full).unwrap();
        assert_eq!(clf.classes()[1].covariance[(0, 0)], 0.0);
        let err = clf.log_likelihoods(&x).unwrap_err();
        assert!(matches!(err, ProbError::Core(CoreError::SingularCovariance { .. })));
    }

    #[test]
    fn test_empty_class_is_rejected() {
        let (x, _) = two_blobs();
        let err = GaussianClassifier::fit(&x, &[0, 0, 0, 2, 2, 2], 3, CovarianceModel::Full);
        assert_eq!(err, Err(ProbError::Core(CoreError::EmptyClass { class: 1 })));
    }

    #[test]
    fn test_classifier_separates_blobs() {
        let (x, labels) = two_blobs();
        for model in [CovarianceModel::Naive, CovarianceModel::Tied] {
            let clf = GaussianClassifier::fit(&x, &labels, 2, model).unwrap();
            let pred = clf.predict(&x, &Priors::uniform(2).unwrap()).unwrap();
            assert_eq!(pred, labels, "{model:?}");
            let llr = clf.llr(&x).unwrap();
            assert!(llr[0] < 0.0 && llr[5] > 0.0);
        }
    }

    #[test]
    fn test_log_likelihood_shape() {
        let (x, labels) = two_blobs();
        let clf = GaussianClassifier::fit(&x, &labels, 2, CovarianceModel::Tied).unwrap();
        let ll = clf.log_likelihoods(&x).unwrap();
        assert_eq!(ll.shape(), (2, 6));
        assert_eq!(clf.n_classes(), 2);
    }
}
