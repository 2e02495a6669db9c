//! Synthetic datasets for tests across the workspace.
//!
//! Every generator takes an explicit seed so test outcomes are reproducible.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Samples from N(mean, I), one per column.
pub fn isotropic_samples(mean: &[f64], n: usize, rng: &mut StdRng) -> DMatrix<f64> {
    DMatrix::from_fn(mean.len(), n, |r, _| mean[r] + rng.sample::<f64, _>(StandardNormal))
}

/// Samples from N(mean, L Lᵀ) where `chol` is the lower factor L.
pub fn correlated_samples(
    mean: &[f64],
    chol: &DMatrix<f64>,
    n: usize,
    rng: &mut StdRng,
) -> DMatrix<f64> {
    let d = mean.len();
    let z = DMatrix::from_fn(d, n, |_, _| rng.sample::<f64, _>(StandardNormal));
    let mut x = chol * z;
    let mu = DVector::from_column_slice(mean);
    for mut col in x.column_iter_mut() {
        col += &mu;
    }
    x
}

/// Identity-covariance blobs, `n_per_class` samples around each mean.
///
/// Labels follow the order of `means`; samples are grouped by class.
pub fn gaussian_blobs(means: &[&[f64]], n_per_class: usize, seed: u64) -> (DMatrix<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let d = means[0].len();
    let mut x = DMatrix::zeros(d, means.len() * n_per_class);
    let mut labels = Vec::with_capacity(means.len() * n_per_class);
    for (class, mean) in means.iter().enumerate() {
        let block = isotropic_samples(mean, n_per_class, &mut rng);
        x.columns_mut(class * n_per_class, n_per_class).copy_from(&block);
        labels.extend(std::iter::repeat(class).take(n_per_class));
    }
    (x, labels)
}

/// Two well-separated classes: means `[0, 0]` and `[5, 5]`, identity covariance.
pub fn two_separated_classes(n_per_class: usize, seed: u64) -> (DMatrix<f64>, Vec<usize>) {
    gaussian_blobs(&[&[0.0, 0.0], &[5.0, 5.0]], n_per_class, seed)
}

/// A random symmetric positive-definite matrix with eigenvalues ≥ `min_eig`.
pub fn random_spd(d: usize, min_eig: f64, rng: &mut StdRng) -> DMatrix<f64> {
    let a = DMatrix::from_fn(d, d, |_, _| rng.gen_range(-1.0..1.0));
    &a * a.transpose() + DMatrix::identity(d, d) * min_eig
}

/// A 1-D mixture of two well-separated modes.
pub fn bimodal_1d(n_per_mode: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = DMatrix::zeros(1, 2 * n_per_mode);
    for n in 0..2 * n_per_mode {
        let centre = if n < n_per_mode { -4.0 } else { 4.0 };
        x[(0, n)] = centre + rng.sample::<f64, _>(StandardNormal);
    }
    x
}

/// Binary scores: positives around `+shift`, negatives around `-shift`, unit spread.
pub fn binary_scores(n_per_class: usize, shift: f64, seed: u64) -> (Vec<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scores = Vec::with_capacity(2 * n_per_class);
    let mut labels = Vec::with_capacity(2 * n_per_class);
    for class in 0..2 {
        let centre = if class == 1 { shift } else { -shift };
        for _ in 0..n_per_class {
            scores.push(centre + rng.sample::<f64, _>(StandardNormal));
            labels.push(class);
        }
    }
    (scores, labels)
}
