//! # Models - Discriminative Classifiers and Projections
//!
//! Everything here is fitted by numerical optimization or by an
//! eigen-decomposition, on `D × N` feature matrices with binary labels:
//!
//! - **Logistic regression**: L2-regularized, optionally prior-weighted, on
//!   linear or quadratic features
//! - **Support vector machines**: one dual solver for the linear and kernel
//!   variants, with a duality-gap report
//! - **Score calibration**: prior-weighted logistic recalibration and fusion,
//!   plus out-of-fold calibration
//! - **PCA and LDA**: dimensionality reduction and the LDA threshold
//!   classifier
//! - **Reports**: error rate, actual DCF and minimum DCF of a scorer
//!
//! Every fitted model implements [`BinaryScorer`]: larger scores mean
//! "more like class 1".
//!
//! ## Example: Logistic Regression
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use patrec_eval::DcfOptions;
//! use patrec_models::{BinaryReport, BinaryScorer, LogRegConfig, LogisticRegression};
//! use patrec_prob::BinaryApplication;
//!
//! let x = DMatrix::from_row_slice(1, 8, &[-2.0, -1.5, -1.0, 0.2, -0.2, 1.0, 1.5, 2.0]);
//! let labels = vec![0, 0, 0, 0, 1, 1, 1, 1];
//! let model = LogisticRegression::fit(&x, &labels, &LogRegConfig::default()).unwrap();
//!
//! assert!(model.weights()[0] > 0.0);
//! let app = BinaryApplication::default();
//! let report = BinaryReport::for_model(&model, &x, &labels, &app, &DcfOptions::exact()).unwrap();
//! assert!(report.error_rate <= 0.25);
//! ```

pub mod calibration;
mod error;
pub mod kernel;
pub mod lda;
pub mod logreg;
pub mod pca;
pub mod report;
pub mod svm;
pub mod training;

pub use calibration::{calibrate_k_fold, ScoreCalibrator};
pub use error::ModelError;
pub use kernel::Kernel;
pub use lda::{scatter_matrices, Lda, LdaClassifier};
pub use logreg::{
    quadratic_features, FeatureExpansion, GradientMode, LogRegConfig, LogisticRegression,
};
pub use pca::Pca;
pub use report::BinaryReport;
pub use svm::{linear_primal_objective, DecisionFunction, DualityReport, Svm, SvmConfig};
pub use training::{BinaryScorer, TrainingSummary};
