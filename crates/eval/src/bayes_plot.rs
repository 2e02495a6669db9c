//! Bayes error plot data: actual and minimum DCF across applications.
//!
//! Each point is the application with unit costs and effective prior
//! `π̃ = 1 / (1 + e^{-p})` for prior log-odds `p`. Comparing the two curves
//! shows how much of the actual cost is due to miscalibration.

use patrec_prob::{effective_prior_from_log_odds, BinaryApplication};
use serde::{Deserialize, Serialize};

use crate::dcf::{actual_dcf_from_sweep, min_dcf_from_sweep, DcfOptions};
use crate::error::EvalError;
use crate::sweep::ThresholdSweep;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesErrorPoint {
    pub log_odds: f64,
    pub effective_prior: f64,
    pub actual_dcf: f64,
    pub min_dcf: f64,
}

/// Actual and minimum normalized DCF of `llr` for every log-odds value.
///
/// The scores are sorted once and shared by all points.
///
/// Usable log-odds lie roughly in `(-745, 36.7)`: beyond that `π̃` rounds to
/// exactly 0 or 1 in `f64`. Every value is checked before any point is
/// computed, and the first unusable one is reported as
/// [`EvalError::InvalidParameter`] naming `log_odds`.
pub fn bayes_error_plot(
    llr: &[f64],
    labels: &[usize],
    log_odds: &[f64],
    opts: &DcfOptions,
) -> Result<Vec<BayesErrorPoint>, EvalError> {
    let opts = opts.validate()?;
    let priors = log_odds
        .iter()
        .map(|&p| usable_effective_prior(p))
        .collect::<Result<Vec<_>, _>>()?;
    let sweep = ThresholdSweep::new(llr, labels)?;
    log_odds
        .iter()
        .zip(priors)
        .map(|(&p, effective_prior)| -> Result<BayesErrorPoint, EvalError> {
            let app = BinaryApplication::with_effective_prior(effective_prior)?;
            Ok(BayesErrorPoint {
                log_odds: p,
                effective_prior,
                actual_dcf: actual_dcf_from_sweep(&sweep, &app, &opts),
                min_dcf: min_dcf_from_sweep(&sweep, &app, &opts)?.value,
            })
        })
        .collect()
}

fn usable_effective_prior(log_odds: f64) -> Result<f64, EvalError> {
    let prior = effective_prior_from_log_odds(log_odds);
    if log_odds.is_finite() && prior > 0.0 && prior < 1.0 {
        Ok(prior)
    } else {
        Err(EvalError::InvalidParameter {
            name: "log_odds".into(),
            reason: format!("{log_odds} gives effective prior {prior}, outside (0, 1)"),
        })
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcf::{actual_dcf, min_dcf};

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(-3.0, 3.0, 3), vec![-3.0, 0.0, 3.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_points_match_direct_evaluation() {
        let llr = [-2.5, -0.4, 0.3, 1.1, -1.0, 2.2, 0.0, -0.2];
        let labels = [0, 0, 1, 1, 0, 1, 1, 0];
        let opts = DcfOptions::default();
        let plot = bayes_error_plot(&llr, &labels, &linspace(-3.0, 3.0, 13), &opts).unwrap();
        assert_eq!(plot.len(), 13);
        for point in &plot {
            let app = BinaryApplication::with_effective_prior(point.effective_prior).unwrap();
            let act = actual_dcf(&llr, &labels, &app, &opts).unwrap();
            let min = min_dcf(&llr, &labels, &app, &opts).unwrap().value;
            assert!((point.actual_dcf - act).abs() < 1e-9);
            assert!((point.min_dcf - min).abs() < 1e-12);
            assert!(point.min_dcf <= point.actual_dcf + 1e-12);
        }
    }

    #[test]
    fn test_symmetric_at_zero_log_odds() {
        let plot = bayes_error_plot(&[-1.0, 1.0], &[0, 1], &[0.0], &DcfOptions::exact()).unwrap();
        assert_eq!(plot[0].effective_prior, 0.5);
        assert_eq!(plot[0].actual_dcf, 0.0);
    }

    #[test]
    fn test_extreme_log_odds_rejected() {
        // π̃ rounds to exactly 1
        assert!(bayes_error_plot(&[0.0, 1.0], &[0, 1], &[50.0], &DcfOptions::default()).is_err());
    }

    #[test]
    fn test_log_odds_range_checked_up_front() {
        let llr = [-1.0, 0.5, 1.0, -0.2];
        let labels = [0, 1, 1, 0];
        let opts = DcfOptions::default();
        for bad in [[-800.0, 0.0, 1.0], [0.0, 40.0, 1.0], [0.0, f64::NAN, 1.0]] {
            match bayes_error_plot(&llr, &labels, &bad, &opts) {
                Err(EvalError::InvalidParameter { name, .. }) => assert_eq!(name, "log_odds"),
                other => panic!("expected a log_odds error, got {other:?}"),
            }
        }
        let plot = bayes_error_plot(&llr, &labels, &[-30.0, 0.0, 30.0], &opts).unwrap();
        assert_eq!(plot.len(), 3);
        assert!(plot.iter().all(|p| p.effective_prior > 0.0 && p.effective_prior < 1.0));
    }
}
