//! # Prob - Generative Models and Bayes Decisions
//!
//! This crate turns class-conditional densities into decisions:
//!
//! - **Priors and costs**: validated prior vectors, `K × K` cost matrices
//!   indexed `[predicted, actual]`, and binary applications `(π₁, Cfn, Cfp)`
//! - **Inference pipeline**: likelihoods → joint → posterior → decision, in
//!   either the log or the probability domain
//! - **Gaussian classifiers**: ML estimation with full, naive (diagonal) or
//!   tied covariances
//! - **Gaussian mixtures**: EM with an eigenvalue floor, LBG doubling, and a
//!   per-class mixture classifier
//!
//! Scores are `K × N` matrices: one row per class, one column per sample.
//!
//! ## Example: Binary Gaussian Classifier
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use patrec_prob::{
//!     decide_binary, BinaryApplication, CovarianceModel, GaussianClassifier,
//!     GenerativeClassifier,
//! };
//!
//! let x = DMatrix::from_row_slice(1, 6, &[0.1, -0.2, 0.3, 2.1, 1.8, 2.4]);
//! let labels = vec![0, 0, 0, 1, 1, 1];
//! let clf = GaussianClassifier::fit(&x, &labels, 2, CovarianceModel::Tied).unwrap();
//!
//! // Rare targets raise the LLR threshold
//! let app = BinaryApplication::new(0.1, 1.0, 1.0).unwrap();
//! let llr = clf.llr(&x).unwrap();
//! let decisions = decide_binary(&llr, &app);
//! assert_eq!(decisions[0], 0);
//! assert_eq!(decisions[5], 1);
//! ```

pub mod cost;
mod error;
pub mod gaussian;
pub mod gmm;
pub mod inference;
pub mod priors;

pub use cost::{effective_prior_from_log_odds, prior_log_odds, BinaryApplication, CostMatrix};
pub use error::ProbError;
pub use gaussian::{estimate_class_gaussians, ClassGaussian, CovarianceModel, GaussianClassifier};
pub use gmm::{
    em_step, lbg_split, train_em, train_lbg, EmReport, Gmm, GmmClassifier, GmmComponent,
    GmmConfig, GmmCovariance,
};
pub use inference::{
    classify, decide_binary, decide_map, decide_min_cost, decide_threshold, llr,
    GenerativeClassifier, Scores,
};
pub use priors::Priors;

/// Tolerance for probability-vector normalization checks.
pub const PROB_TOLERANCE: f64 = 1e-6;
