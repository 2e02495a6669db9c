//! Linear discriminant analysis and the binary projection classifier.
//!
//! LDA maximizes between-class over within-class scatter. The generalized
//! eigenproblem `S_B·w = λ·S_W·w` is solved by joint diagonalization:
//! whiten with `P₁ = U·Σ^{-1/2}·Uᵀ` from `S_W = U·Σ·Uᵀ`, then take the
//! leading eigenvectors `P₂` of `P₁·S_B·P₁ᵀ`. The projection is `P₁ᵀ·P₂`.

use nalgebra::{DMatrix, DVector};
use patrec_core::dataset::{check_labels, partition_by_class};
use patrec_core::matrix::{mean, mean_covariance, symmetric_eigen_desc};
use patrec_core::CoreError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;
use crate::pca::Pca;
use crate::training::{check_features, signed_labels, BinaryScorer};

/// Between-class and within-class scatter, both normalized by N.
pub fn scatter_matrices(
    x: &DMatrix<f64>,
    labels: &[usize],
    n_classes: usize,
) -> Result<(DMatrix<f64>, DMatrix<f64>), ModelError> {
    check_labels(labels, x.ncols(), n_classes)?;
    let mu = mean(x)?;
    let d = x.nrows();
    let n = x.ncols() as f64;
    let mut sb = DMatrix::zeros(d, d);
    let mut sw = DMatrix::zeros(d, d);
    for xc in &partition_by_class(x, labels, n_classes)? {
        let nc = xc.ncols() as f64;
        let (mu_c, cov_c) = mean_covariance(xc)?;
        let diff = &mu_c - &mu;
        sb += &diff * diff.transpose() * nc;
        sw += cov_c * nc;
    }
    Ok((sb / n, sw / n))
}

/// A fitted LDA projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lda {
    /// `D × m`.
    directions: DMatrix<f64>,
}

impl Lda {
    /// Keep `m` discriminant directions, `1 ≤ m ≤ min(D, K - 1)`.
    ///
    /// For two classes the direction is oriented so class 1 projects to the
    /// right of class 0.
    pub fn fit(
        x: &DMatrix<f64>,
        labels: &[usize],
        n_classes: usize,
        m: usize,
    ) -> Result<Self, ModelError> {
        let available = x.nrows().min(n_classes.saturating_sub(1));
        if m == 0 || m > available {
            return Err(ModelError::TooManyDimensions {
                requested: m,
                available,
            });
        }
        let (sb, sw) = scatter_matrices(x, labels, n_classes)?;

        let (s, u) = symmetric_eigen_desc(&sw)?;
        if s.iter().any(|&v| v.is_nan() || v <= 0.0) {
            return Err(CoreError::SingularCovariance {
                sign: 0.0,
                log_abs_det: f64::NEG_INFINITY,
            }
            .into());
        }
        let whiten = &u * DMatrix::from_diagonal(&s.map(|v| 1.0 / v.sqrt())) * u.transpose();
        let sbt = &whiten * sb * whiten.transpose();
        let (_, p2) = symmetric_eigen_desc(&sbt)?;
        let mut directions = whiten.transpose() * p2.columns(0, m);

        if n_classes == 2 {
            let projected = directions.tr_mul(x);
            let (m0, m1) = class_means(projected.row(0).iter().copied(), labels);
            if m1 < m0 {
                directions.neg_mut();
            }
        }
        debug!(m, n_classes, "LDA fit");
        Ok(Self { directions })
    }

    pub fn dim(&self) -> usize {
        self.directions.ncols()
    }

    pub fn directions(&self) -> &DMatrix<f64> {
        &self.directions
    }

    /// `Wᵀx` for every column.
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ModelError> {
        check_features("LDA input", x, self.directions.nrows())?;
        Ok(self.directions.tr_mul(x))
    }
}

fn class_means(values: impl Iterator<Item = f64>, labels: &[usize]) -> (f64, f64) {
    let mut sums = [0.0; 2];
    let mut counts = [0usize; 2];
    for (v, &l) in values.zip(labels) {
        sums[l] += v;
        counts[l] += 1;
    }
    (sums[0] / counts[0] as f64, sums[1] / counts[1] as f64)
}

/// Binary classifier: optional PCA, one LDA direction, and a threshold at
/// the midpoint of the projected class means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaClassifier {
    pca: Option<Pca>,
    lda: Lda,
    threshold: f64,
}

impl LdaClassifier {
    /// Fit on binary labels, first reducing to `pca_dim` dimensions if given.
    pub fn fit(
        x: &DMatrix<f64>,
        labels: &[usize],
        pca_dim: Option<usize>,
    ) -> Result<Self, ModelError> {
        signed_labels(labels, x.ncols())?;
        let pca = pca_dim.map(|m| Pca::fit(x, m)).transpose()?;
        let reduced = match &pca {
            Some(p) => p.transform(x)?,
            None => x.clone(),
        };
        let lda = Lda::fit(&reduced, labels, 2, 1)?;
        let projected = lda.transform(&reduced)?;
        let (m0, m1) = class_means(projected.row(0).iter().copied(), labels);
        let threshold = 0.5 * (m0 + m1);
        debug!(threshold, class0 = m0, class1 = m1, "LDA classifier fit");
        Ok(Self {
            pca,
            lda,
            threshold,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn lda(&self) -> &Lda {
        &self.lda
    }

    /// Projected values, before the threshold is applied.
    pub fn project(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        let reduced = match &self.pca {
            Some(p) => p.transform(x)?,
            None => x.clone(),
        };
        Ok(self.lda.transform(&reduced)?.row(0).iter().copied().collect())
    }
}

impl BinaryScorer for LdaClassifier {
    /// Projection minus the threshold, so 0 separates the classes.
    fn scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .project(x)?
            .into_iter()
            .map(|v| v - self.threshold)
            .collect())
    }
}

/// Fisher criterion `wᵀS_B·w / wᵀS_W·w` of a direction.
pub fn fisher_ratio(sb: &DMatrix<f64>, sw: &DMatrix<f64>, w: &DVector<f64>) -> f64 {
    w.dot(&(sb * w)) / w.dot(&(sw * w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrec_core::matrix::center;
    use patrec_test_fixtures::gaussian_blobs;

    fn three_classes() -> (DMatrix<f64>, Vec<usize>) {
        gaussian_blobs(&[&[0.0, 0.0, 0.0], &[3.0, 1.0, 0.0], &[0.0, 4.0, 1.0]], 60, 13)
    }

    #[test]
    fn test_scatter_sum_is_total_covariance() {
        let (x, labels) = three_classes();
        let (sb, sw) = scatter_matrices(&x, &labels, 3).unwrap();
        let (_, total) = mean_covariance(&x).unwrap();
        assert!((sb + sw - total).amax() < 1e-9);
    }

    #[test]
    fn test_leading_direction_maximizes_fisher_ratio() {
        let (x, labels) = three_classes();
        let (sb, sw) = scatter_matrices(&x, &labels, 3).unwrap();
        let lda = Lda::fit(&x, &labels, 3, 2).unwrap();
        let w0 = lda.directions().column(0).into_owned();
        let w1 = lda.directions().column(1).into_owned();
        let best = fisher_ratio(&sb, &sw, &w0);
        assert!(best >= fisher_ratio(&sb, &sw, &w1));
        for probe in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 1.0], [0.3, -0.2, 0.9]] {
            let p = DVector::from_row_slice(&probe);
            assert!(best >= fisher_ratio(&sb, &sw, &p) - 1e-9);
        }
    }

    #[test]
    fn test_projected_within_scatter_is_identity() {
        let (x, labels) = three_classes();
        let (_, sw) = scatter_matrices(&x, &labels, 3).unwrap();
        let w = Lda::fit(&x, &labels, 3, 2).unwrap().directions().clone();
        let projected = w.transpose() * sw * &w;
        assert!((projected - DMatrix::identity(2, 2)).amax() < 1e-9);
    }

    #[test]
    fn test_binary_orientation_and_threshold() {
        // Class 1 on the left in the raw features
        let (x, labels) = gaussian_blobs(&[&[3.0, 1.0], &[-1.0, 0.0]], 80, 2);
        let clf = LdaClassifier::fit(&x, &labels, None).unwrap();
        let proj = clf.project(&x).unwrap();
        let (m0, m1) = class_means(proj.iter().copied(), &labels);
        assert!(m1 > m0);
        assert!((clf.threshold() - 0.5 * (m0 + m1)).abs() < 1e-12);
        let pred = clf.predict(&x, 0.0).unwrap();
        let wrong = pred.iter().zip(&labels).filter(|(p, l)| p != l).count();
        assert!(wrong <= 8, "{wrong} errors");
    }

    #[test]
    fn test_pca_then_lda() {
        let (x, raw) = three_classes();
        let labels: Vec<usize> = raw.iter().map(|&l| usize::from(l == 1)).collect();
        let clf = LdaClassifier::fit(&x, &labels, Some(2)).unwrap();
        assert_eq!(clf.lda().dim(), 1);
        assert!(clf.scores(&x).unwrap().len() == x.ncols());
    }

    #[test]
    fn test_translation_invariance() {
        let (x, labels) = three_classes();
        let a = Lda::fit(&x, &labels, 3, 1).unwrap();
        let shifted = center(&x, &mean(&x).unwrap()).unwrap();
        let b = Lda::fit(&shifted, &labels, 3, 1).unwrap();
        let da = a.directions().column(0).into_owned();
        let db = b.directions().column(0).into_owned();
        assert!((da.dot(&db).abs() / (da.norm() * db.norm()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_and_class_checks() {
        let (x, labels) = three_classes();
        assert!(matches!(
            Lda::fit(&x, &labels, 3, 3),
            Err(ModelError::TooManyDimensions { requested: 3, available: 2 })
        ));
        let only_two: Vec<usize> = labels.iter().map(|&l| l.min(1)).collect();
        assert!(Lda::fit(&x, &only_two, 3, 1).is_err());
    }
}
