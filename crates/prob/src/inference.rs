//! The Bayes inference pipeline: likelihoods → joint → posterior → decision.
//!
//! Class-conditional scores come as a `K × N` matrix, one row per class and
//! one column per sample. [`Scores`] records once, at the boundary, whether
//! the entries are log-likelihoods or plain likelihoods; every later step
//! dispatches on that tag instead of threading a flag through each call.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use patrec_prob::{decide_map, Priors, Scores};
//!
//! // Two classes, two samples, log-likelihoods
//! let ll = DMatrix::from_row_slice(2, 2, &[-1.0, -5.0, -3.0, -0.5]);
//! let post = Scores::Log(ll).posteriors(&Priors::uniform(2).unwrap()).unwrap();
//!
//! // Each column of the posterior sums to one
//! let p = post.probabilities();
//! assert!((p[(0, 0)] + p[(1, 0)] - 1.0).abs() < 1e-12);
//! assert_eq!(decide_map(&post), vec![0, 1]);
//! ```

use nalgebra::DMatrix;
use patrec_core::special::log_sum_exp_columns;

use crate::cost::{BinaryApplication, CostMatrix};
use crate::error::ProbError;
use crate::priors::Priors;

/// A `K × N` score matrix tagged with its domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// Log-likelihoods, log-joints or log-posteriors.
    Log(DMatrix<f64>),
    /// Likelihoods, joints or posteriors in the probability domain.
    Linear(DMatrix<f64>),
}

impl Scores {
    pub fn matrix(&self) -> &DMatrix<f64> {
        match self {
            Scores::Log(m) | Scores::Linear(m) => m,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.matrix().nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.matrix().ncols()
    }

    pub fn is_log(&self) -> bool {
        matches!(self, Scores::Log(_))
    }

    /// Combine with class priors: `ll + ln π` in log space, `l · π` otherwise.
    pub fn joint(&self, priors: &Priors) -> Result<Scores, ProbError> {
        check_classes(self.n_classes(), priors.len())?;
        Ok(match self {
            Scores::Log(ll) => {
                let log_pi = priors.log();
                let mut joint = ll.clone();
                for mut col in joint.column_iter_mut() {
                    col += &log_pi;
                }
                Scores::Log(joint)
            }
            Scores::Linear(l) => {
                let pi = priors.to_vector();
                let mut joint = l.clone();
                for mut col in joint.column_iter_mut() {
                    col.component_mul_assign(&pi);
                }
                Scores::Linear(joint)
            }
        })
    }

    /// Class posteriors, normalised over the class axis of each column.
    ///
    /// In log space the normaliser is a column-wise log-sum-exp. In the
    /// probability domain a column whose joint sums to zero is an error.
    pub fn posteriors(&self, priors: &Priors) -> Result<Scores, ProbError> {
        Ok(match self.joint(priors)? {
            Scores::Log(mut joint) => {
                let marginal = log_sum_exp_columns(&joint);
                for (n, mut col) in joint.column_iter_mut().enumerate() {
                    col.add_scalar_mut(-marginal[n]);
                }
                Scores::Log(joint)
            }
            Scores::Linear(mut joint) => {
                for mut col in joint.column_iter_mut() {
                    let total = col.sum();
                    if !(total > 0.0) {
                        return Err(ProbError::ZeroWeights);
                    }
                    col /= total;
                }
                Scores::Linear(joint)
            }
        })
    }

    /// The entries mapped to the probability domain.
    pub fn probabilities(&self) -> DMatrix<f64> {
        match self {
            Scores::Log(m) => m.map(f64::exp),
            Scores::Linear(m) => m.clone(),
        }
    }

    /// The entries mapped to the log domain.
    pub fn log_values(&self) -> DMatrix<f64> {
        match self {
            Scores::Log(m) => m.clone(),
            Scores::Linear(m) => m.map(f64::ln),
        }
    }
}

/// Maximum-a-posteriori decision: arg max over classes for each column.
///
/// Ties resolve to the lowest class index. The domain tag is irrelevant
/// since `ln` is monotone.
pub fn decide_map(posteriors: &Scores) -> Vec<usize> {
    posteriors
        .matrix()
        .column_iter()
        .map(|col| col.argmax().0)
        .collect()
}

/// Minimum expected cost decision: arg min of `C · P` for each column.
pub fn decide_min_cost(posteriors: &Scores, costs: &CostMatrix) -> Result<Vec<usize>, ProbError> {
    let expected = costs.expected_costs(&posteriors.probabilities())?;
    Ok(expected.column_iter().map(|col| col.argmin().0).collect())
}

/// Binary Bayes decision: class 1 where `llr > t*` for the application's
/// optimal threshold.
pub fn decide_binary(llr: &[f64], app: &BinaryApplication) -> Vec<usize> {
    decide_threshold(llr, app.threshold())
}

/// Class 1 where `score > threshold`, class 0 otherwise.
pub fn decide_threshold(scores: &[f64], threshold: f64) -> Vec<usize> {
    scores.iter().map(|&s| usize::from(s > threshold)).collect()
}

/// Full pipeline from class-conditional log-likelihoods to decisions.
///
/// With no cost matrix the MAP rule is used.
pub fn classify(
    log_likelihoods: &DMatrix<f64>,
    priors: &Priors,
    costs: Option<&CostMatrix>,
) -> Result<Vec<usize>, ProbError> {
    let posteriors = Scores::Log(log_likelihoods.clone()).posteriors(priors)?;
    match costs {
        Some(c) => decide_min_cost(&posteriors, c),
        None => Ok(decide_map(&posteriors)),
    }
}

/// Log-likelihood ratio `ll[1] - ll[0]` of a `2 × N` log-likelihood matrix.
pub fn llr(log_likelihoods: &DMatrix<f64>) -> Result<Vec<f64>, ProbError> {
    if log_likelihoods.nrows() != 2 {
        return Err(ProbError::NotBinary {
            n_classes: log_likelihoods.nrows(),
        });
    }
    Ok(log_likelihoods
        .column_iter()
        .map(|col| col[1] - col[0])
        .collect())
}

/// A fitted model producing class-conditional log-likelihoods.
///
/// Implementors only provide the `K × N` score matrix; posteriors,
/// decisions and LLRs follow from the pipeline above.
pub trait GenerativeClassifier {
    /// Number of classes K.
    fn n_classes(&self) -> usize;

    /// `K × N` log-likelihoods `ln p(x_n | class k)`.
    fn log_likelihoods(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ProbError>;

    /// Class posteriors for the columns of `x` (log domain).
    fn posteriors(&self, x: &DMatrix<f64>, priors: &Priors) -> Result<Scores, ProbError> {
        Scores::Log(self.log_likelihoods(x)?).posteriors(priors)
    }

    /// MAP labels under `priors`.
    fn predict(&self, x: &DMatrix<f64>, priors: &Priors) -> Result<Vec<usize>, ProbError> {
        Ok(decide_map(&self.posteriors(x, priors)?))
    }

    /// Binary log-likelihood ratios; fails unless K = 2.
    fn llr(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ProbError> {
        llr(&self.log_likelihoods(x)?)
    }
}

fn check_classes(expected: usize, got: usize) -> Result<(), ProbError> {
    if expected != got {
        return Err(ProbError::ShapeMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_ll() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 4, &[
            -1.0, -4.0, -2.0, -900.0, //
            -2.0, -1.0, -2.0, -905.0, //
            -3.0, -6.0, -0.5, -901.0,
        ])
    }

    #[test]
    fn test_log_posteriors_sum_to_one() {
        let priors = Priors::new(vec![0.2, 0.5, 0.3]).unwrap();
        let post = Scores::Log(toy_ll()).posteriors(&priors).unwrap();
        let p = post.probabilities();
        for col in p.column_iter() {
            assert!((col.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_log_and_linear_paths_agree() {
        let priors = Priors::new(vec![0.2, 0.5, 0.3]).unwrap();
        let ll = toy_ll().columns(0, 3).into_owned();
        let log_post = Scores::Log(ll.clone()).posteriors(&priors).unwrap();
        let lin_post = Scores::Linear(ll.map(f64::exp)).posteriors(&priors).unwrap();
        let diff = log_post.probabilities() - lin_post.probabilities();
        assert!(diff.amax() < 1e-12);
    }

    #[test]
    fn test_linear_underflow_column_fails() {
        // exp(-900) underflows to zero in every class
        let lin = Scores::Linear(toy_ll().map(f64::exp));
        assert_eq!(
            lin.posteriors(&Priors::uniform(3).unwrap()),
            Err(ProbError::ZeroWeights)
        );
    }

    #[test]
    fn test_map_and_zero_one_cost_agree() {
        let priors = Priors::uniform(3).unwrap();
        let post = Scores::Log(toy_ll()).posteriors(&priors).unwrap();
        let map = decide_map(&post);
        let min_cost = decide_min_cost(&post, &CostMatrix::zero_one(3).unwrap()).unwrap();
        assert_eq!(map, min_cost);
        assert_eq!(map, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_binary_threshold_matches_cost_decision() {
        let app = BinaryApplication::new(0.3, 1.0, 1.0).unwrap();
        let ll = DMatrix::from_row_slice(2, 5, &[
            -1.0, -2.0, -3.0, -0.2, -4.0, //
            -2.0, -1.0, -2.9, -0.2, -8.0,
        ]);
        let scores = llr(&ll).unwrap();
        let binary = decide_binary(&scores, &app);
        let multi = classify(&ll, &app.priors().unwrap(), Some(&app.cost_matrix().unwrap())).unwrap();
        assert_eq!(binary, multi);
    }

    #[test]
    fn test_joint_adds_log_priors() {
        let priors = Priors::new(vec![0.25, 0.75]).unwrap();
        let ll = DMatrix::from_row_slice(2, 1, &[-1.0, -2.0]);
        let joint = Scores::Log(ll).joint(&priors).unwrap();
        assert!((joint.matrix()[(0, 0)] - (-1.0 + 0.25_f64.ln())).abs() < 1e-12);
        assert!((joint.matrix()[(1, 0)] - (-2.0 + 0.75_f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_prior_count_mismatch() {
        let err = Scores::Log(toy_ll()).joint(&Priors::uniform(2).unwrap());
        assert_eq!(err, Err(ProbError::ShapeMismatch { expected: 3, got: 2 }));
    }

    #[test]
    fn test_llr_requires_two_rows() {
        assert_eq!(llr(&toy_ll()), Err(ProbError::NotBinary { n_classes: 3 }));
    }
}
