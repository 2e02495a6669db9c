//! # Eval - Bayes Risk Evaluation
//!
//! Scores go in, costs come out:
//!
//! - **Confusion matrices** indexed `[predicted, actual]`
//! - **Binary DCF**: empirical Bayes risk of threshold decisions, normalized
//!   by the best constant decision
//! - **minDCF**: the best normalized DCF over all thresholds, found by one
//!   sorted sweep
//! - **Multiclass risk** under an arbitrary cost matrix
//! - **ROC curves** and **Bayes error plot** data
//!
//! ## Example: Calibration Loss
//!
//! ```rust
//! use patrec_eval::{actual_dcf, min_dcf, DcfOptions};
//! use patrec_prob::BinaryApplication;
//!
//! // Well separated but shifted: a threshold exists that makes no errors
//! let llr = [1.0, 1.5, 2.0, 3.5, 4.0, 5.0];
//! let labels = [0, 0, 0, 1, 1, 1];
//! let app = BinaryApplication::default();
//! let opts = DcfOptions::exact();
//!
//! let act = actual_dcf(&llr, &labels, &app, &opts).unwrap();
//! let min = min_dcf(&llr, &labels, &app, &opts).unwrap();
//! assert_eq!(min.value, 0.0);
//! assert!(act > 0.9); // every non-target accepted at t* = 0
//! ```

pub mod bayes_plot;
pub mod confusion;
pub mod dcf;
mod error;
pub mod multiclass;
pub mod roc;
pub mod sweep;

pub use bayes_plot::{bayes_error_plot, linspace, BayesErrorPoint};
pub use confusion::{binary_confusion, error_rate, BinaryCounts, ConfusionMatrix};
pub use dcf::{
    actual_dcf, bayes_risk, error_rates, min_dcf, min_dcf_from_sweep, normalized_bayes_risk,
    DcfOptions, ErrorRates, MinDcf, DEFAULT_PSEUDOCOUNT,
};
pub use error::EvalError;
pub use multiclass::{multiclass_dcf, multiclass_risk, MulticlassEvaluation, MulticlassRisk};
pub use roc::{RocCurve, RocPoint};
pub use sweep::{SweepPoint, ThresholdSweep};
