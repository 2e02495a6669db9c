//! GMM training with LBG doubling, and Gaussian vs mixture classifiers
//!
//! Run with: RUST_LOG=debug cargo run -p patrec-prob --example gmm_lbg
//!
//! This example demonstrates:
//! - LBG schedule 1 → 2 → 4 components with an eigenvalue floor
//! - How the training log-likelihood grows with each doubling
//! - Full, naive and tied Gaussian classifiers on the same data
//! - A per-class GMM classifier on a class that is itself bimodal

use nalgebra::DMatrix;
use patrec_prob::{
    train_lbg, CovarianceModel, GaussianClassifier, GenerativeClassifier, GmmClassifier, GmmConfig,
    GmmCovariance, Priors,
};
use patrec_test_fixtures::gaussian_blobs;
use tracing_subscriber::EnvFilter;

fn error_rate(pred: &[usize], labels: &[usize]) -> f64 {
    let wrong = pred.iter().zip(labels).filter(|(p, l)| p != l).count();
    wrong as f64 / labels.len() as f64
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== GMM Training with LBG ===\n");

    // -------------------------------------------------------------------------
    // 1. Doubling schedule
    // -------------------------------------------------------------------------
    println!("1. LBG doubling on four clusters");
    println!("--------------------------------\n");

    let (x, _) = gaussian_blobs(
        &[&[-4.0, -4.0], &[-4.0, 4.0], &[4.0, -4.0], &[4.0, 4.0]],
        100,
        42,
    );

    for components in [1, 2, 4] {
        let config = GmmConfig::default()
            .with_components(components)
            .with_psi(0.01);
        let report = train_lbg(&x, &config).expect("LBG training");
        println!(
            "  {components} component(s): mean ll = {:.4} after {} EM iterations (converged: {})",
            report.mean_log_likelihood, report.iterations, report.converged
        );
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. Covariance structures
    // -------------------------------------------------------------------------
    println!("2. Covariance structures (4 components)");
    println!("---------------------------------------\n");

    for structure in [GmmCovariance::Full, GmmCovariance::Diagonal, GmmCovariance::Tied] {
        let config = GmmConfig::default()
            .with_components(4)
            .with_psi(0.01)
            .with_covariance(structure);
        let report = train_lbg(&x, &config).expect("LBG training");
        println!("  {structure:?}: mean ll = {:.4}", report.mean_log_likelihood);
    }
    println!();

    // -------------------------------------------------------------------------
    // 3. Classifiers
    // -------------------------------------------------------------------------
    println!("3. Gaussian vs GMM classifiers");
    println!("------------------------------\n");

    // Class 0 has two modes on either side of class 1
    let (raw, raw_labels) = gaussian_blobs(&[&[-5.0, 0.0], &[0.0, 0.0], &[5.0, 0.0]], 150, 7);
    let labels: Vec<usize> = raw_labels.iter().map(|&l| usize::from(l == 1)).collect();
    let x: DMatrix<f64> = raw;
    let priors = Priors::uniform(2).expect("priors");

    for model in [CovarianceModel::Full, CovarianceModel::Naive, CovarianceModel::Tied] {
        let clf = GaussianClassifier::fit(&x, &labels, 2, model).expect("fit");
        let pred = clf.predict(&x, &priors).expect("predict");
        println!("  {model:?} Gaussian: error rate {:.3}", error_rate(&pred, &labels));
    }

    let clf = GmmClassifier::fit(&x, &labels, 2, &GmmConfig::default().with_components(2).with_psi(0.01))
        .expect("fit");
    let pred = clf.predict(&x, &priors).expect("predict");
    println!("  2-component GMM: error rate {:.3}", error_rate(&pred, &labels));
    println!();

    println!("=== Done ===");
}
