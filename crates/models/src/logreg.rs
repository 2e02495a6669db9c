//! Binary logistic regression.
//!
//! Minimizes the regularized, per-sample weighted logistic loss
//!
//! ```text
//! J(w, b) = λ/2·‖w‖² + Σ_i ξ_i·ln(1 + exp(-z_i·(wᵀφ(x_i) + b)))
//! ```
//!
//! with `z_i ∈ {-1, +1}`. The plain model uses `ξ_i = 1/N`. The
//! prior-weighted model uses `ξ_i = π_T/n_T` for targets and
//! `(1 - π_T)/n_F` for non-targets, so the training class balance no longer
//! matters and the scores behave like posterior log-odds under prior `π_T`.
//!
//! Subtracting the training prior log-odds from a score gives an LLR-like
//! value that can be compared with application thresholds.

use nalgebra::{DMatrix, DVector};
use patrec_core::special::{log1p_exp, sigmoid};
use patrec_optim::{Bounds, Lbfgs, LbfgsOptions, OptimizeResult, ValueOnly, WithGradient};
use patrec_prob::prior_log_odds;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ModelError;
use crate::training::{check_features, signed_labels, BinaryScorer, TrainingSummary};

/// How the optimizer obtains the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMode {
    /// Closed-form gradient of the objective.
    #[default]
    Analytic,
    /// Forward differences on the objective value.
    FiniteDifference,
}

/// Input feature map `φ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureExpansion {
    /// `φ(x) = x`.
    #[default]
    Linear,
    /// `φ(x) = [vec(xxᵀ); x]`, giving quadratic decision boundaries.
    Quadratic,
}

impl FeatureExpansion {
    /// Dimension of `φ(x)` for `d`-dimensional `x`.
    pub fn output_dim(self, d: usize) -> usize {
        match self {
            FeatureExpansion::Linear => d,
            FeatureExpansion::Quadratic => d * d + d,
        }
    }

    pub fn apply(self, x: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            FeatureExpansion::Linear => x.clone(),
            FeatureExpansion::Quadratic => quadratic_features(x),
        }
    }
}

/// `[vec(xxᵀ); x]` for every column, `vec` stacking columns.
pub fn quadratic_features(x: &DMatrix<f64>) -> DMatrix<f64> {
    let d = x.nrows();
    DMatrix::from_fn(d * d + d, x.ncols(), |r, n| {
        if r < d * d {
            x[(r % d, n)] * x[(r / d, n)]
        } else {
            x[(r - d * d, n)]
        }
    })
}

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRegConfig {
    /// Regularization strength λ.
    pub lambda: f64,
    /// Target prior `π_T` for the prior-weighted loss; `None` for the plain
    /// mean loss.
    pub prior_weighting: Option<f64>,
    pub gradient: GradientMode,
    pub features: FeatureExpansion,
    pub optimizer: LbfgsOptions,
}

impl Default for LogRegConfig {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            prior_weighting: None,
            gradient: GradientMode::Analytic,
            features: FeatureExpansion::Linear,
            optimizer: LbfgsOptions::default(),
        }
    }
}

impl LogRegConfig {
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_prior_weighting(mut self, target_prior: f64) -> Self {
        self.prior_weighting = Some(target_prior);
        self
    }

    pub fn with_gradient(mut self, gradient: GradientMode) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_features(mut self, features: FeatureExpansion) -> Self {
        self.features = features;
        self
    }

    pub fn with_optimizer(mut self, optimizer: LbfgsOptions) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.lambda >= 0.0 && self.lambda.is_finite()) {
            return Err(ModelError::invalid("lambda", "must be finite and non-negative"));
        }
        if let Some(p) = self.prior_weighting {
            if !(p > 0.0 && p < 1.0) {
                return Err(ModelError::invalid(
                    "prior_weighting",
                    format!("{p} is not in (0, 1)"),
                ));
            }
        }
        Ok(())
    }
}

/// The weighted logistic objective over expanded features.
struct LogisticObjective<'a> {
    phi: &'a DMatrix<f64>,
    z: &'a [f64],
    xi: &'a [f64],
    lambda: f64,
}

impl LogisticObjective<'_> {
    fn split(v: &DVector<f64>) -> (DVector<f64>, f64) {
        let d = v.len() - 1;
        (v.rows(0, d).into_owned(), v[d])
    }

    fn value(&self, v: &DVector<f64>) -> f64 {
        let (w, b) = Self::split(v);
        let s = self.phi.tr_mul(&w);
        let loss: f64 = (0..self.z.len())
            .map(|i| self.xi[i] * log1p_exp(-self.z[i] * (s[i] + b)))
            .sum();
        0.5 * self.lambda * w.norm_squared() + loss
    }

    fn value_and_gradient(&self, v: &DVector<f64>) -> (f64, DVector<f64>) {
        let (w, b) = Self::split(v);
        let s = self.phi.tr_mul(&w);
        let mut loss = 0.0;
        let g = DVector::from_fn(self.z.len(), |i, _| {
            let margin = self.z[i] * (s[i] + b);
            loss += self.xi[i] * log1p_exp(-margin);
            -self.z[i] * self.xi[i] * sigmoid(-margin)
        });

        let mut grad = DVector::zeros(v.len());
        let d = w.len();
        grad.rows_mut(0, d)
            .copy_from(&(&w * self.lambda + self.phi * &g));
        grad[d] = g.sum();
        (0.5 * self.lambda * w.norm_squared() + loss, grad)
    }
}

/// A fitted logistic regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: DVector<f64>,
    bias: f64,
    features: FeatureExpansion,
    input_dim: usize,
    training_log_odds: f64,
    summary: TrainingSummary,
}

impl LogisticRegression {
    /// Fit on `D × N` features with binary labels.
    pub fn fit(x: &DMatrix<f64>, labels: &[usize], config: &LogRegConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let z = signed_labels(labels, x.ncols())?;
        let n = z.len();
        let n_targets = labels.iter().filter(|&&l| l == 1).count();
        let n_non_targets = n - n_targets;

        let (xi, training_prior) = match config.prior_weighting {
            Some(pt) => {
                let wt = pt / n_targets as f64;
                let wf = (1.0 - pt) / n_non_targets as f64;
                let xi: Vec<f64> = z.iter().map(|&zi| if zi > 0.0 { wt } else { wf }).collect();
                (xi, pt)
            }
            None => (vec![1.0 / n as f64; n], n_targets as f64 / n as f64),
        };

        let phi = config.features.apply(x);
        let objective = LogisticObjective {
            phi: &phi,
            z: &z,
            xi: &xi,
            lambda: config.lambda,
        };
        let x0 = DVector::zeros(phi.nrows() + 1);
        let bounds = Bounds::unbounded(x0.len());
        let lbfgs = Lbfgs::new(config.optimizer.clone());
        let result: OptimizeResult = match config.gradient {
            GradientMode::Analytic => lbfgs.minimize(
                &WithGradient::new(|v: &DVector<f64>| objective.value_and_gradient(v)),
                x0,
                &bounds,
            )?,
            GradientMode::FiniteDifference => {
                lbfgs.minimize(&ValueOnly::new(|v: &DVector<f64>| objective.value(v)), x0, &bounds)?
            }
        };

        let summary = TrainingSummary::from(&result);
        if !summary.converged() {
            warn!(
                status = ?summary.status,
                objective = summary.objective,
                iterations = summary.iterations,
                "logistic regression stopped before convergence"
            );
        }
        info!(
            lambda = config.lambda,
            prior_weighting = ?config.prior_weighting,
            objective = summary.objective,
            iterations = summary.iterations,
            evaluations = summary.evaluations,
            "logistic regression fit"
        );

        let d = phi.nrows();
        Ok(Self {
            weights: result.x.rows(0, d).into_owned(),
            bias: result.x[d],
            features: config.features,
            input_dim: x.nrows(),
            training_log_odds: prior_log_odds(training_prior),
            summary,
        })
    }

    /// Weights over the expanded features.
    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn features(&self) -> FeatureExpansion {
        self.features
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    /// `ln(π/(1-π))` of the prior the model was trained under: `π_T` when
    /// prior-weighted, the empirical target fraction otherwise.
    pub fn training_log_odds(&self) -> f64 {
        self.training_log_odds
    }

    /// Raw scores `wᵀφ(x) + b`, posterior log-odds under the training prior.
    pub fn raw_scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        check_features("logistic regression input", x, self.input_dim)?;
        let phi = self.features.apply(x);
        Ok(phi.tr_mul(&self.weights).iter().map(|s| s + self.bias).collect())
    }

    /// LLR-like scores: raw scores minus the training prior log-odds.
    pub fn llr(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .raw_scores(x)?
            .into_iter()
            .map(|s| s - self.training_log_odds)
            .collect())
    }

    /// Target posterior under the training prior.
    pub fn posterior(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        Ok(self.raw_scores(x)?.into_iter().map(sigmoid).collect())
    }
}

impl BinaryScorer for LogisticRegression {
    fn scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        self.llr(x)
    }
}
