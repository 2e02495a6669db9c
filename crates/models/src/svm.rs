//! Soft-margin SVM trained in the dual.
//!
//! With `z_i ∈ {-1, +1}` and the bias-augmented kernel
//! `k̂(x, y) = k(x, y) + K²`, the dual is solved as the box-constrained
//! minimization
//!
//! ```text
//! L(α) = ½·αᵀHα - 1ᵀα,   H_ij = z_i·z_j·k̂(x_i, x_j),   0 ≤ α_i ≤ C
//! ```
//!
//! The `K²` term stands in for an explicit bias: for the linear kernel it is
//! the same as appending a constant feature `K` to every sample, so the
//! bias is regularized along with the weights.
//!
//! The primal objective at the recovered solution,
//! `½·αᵀHα + C·Σ max(0, 1 - (Hα)_i)`, is compared with the dual optimum
//! `-L(α)`; the gap shrinks to zero as the optimizer converges.

use nalgebra::{DMatrix, DVector};
use patrec_optim::{Bounds, Lbfgs, LbfgsOptions, WithGradient};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ModelError;
use crate::kernel::Kernel;
use crate::training::{check_features, signed_labels, BinaryScorer, TrainingSummary};

/// SVM hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Box constraint C.
    pub c: f64,
    /// Bias constant K; the kernel is augmented with `K²`.
    pub bias: f64,
    /// `None` trains a linear SVM and recovers primal weights.
    pub kernel: Option<Kernel>,
    pub optimizer: LbfgsOptions,
    /// Relative duality gap above which the fit is reported as unreliable.
    pub gap_tolerance: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            bias: 1.0,
            kernel: None,
            optimizer: LbfgsOptions::default()
                .with_factr(None)
                .with_max_evaluations(20000),
            gap_tolerance: 1e-3,
        }
    }
}

impl SvmConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn with_optimizer(mut self, optimizer: LbfgsOptions) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_gap_tolerance(mut self, gap_tolerance: f64) -> Self {
        self.gap_tolerance = gap_tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(ModelError::invalid("c", "must be positive and finite"));
        }
        if !(self.bias >= 0.0 && self.bias.is_finite()) {
            return Err(ModelError::invalid("bias", "must be finite and non-negative"));
        }
        if !(self.gap_tolerance >= 0.0) {
            return Err(ModelError::invalid("gap_tolerance", "must be non-negative"));
        }
        if let Some(kernel) = &self.kernel {
            kernel.validate()?;
        }
        Ok(())
    }
}

/// Primal and dual objectives at the returned solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualityReport {
    pub primal: f64,
    /// Dual objective `-L(α)`, to be maximized.
    pub dual: f64,
    /// `primal - dual`, non-negative up to rounding.
    pub gap: f64,
}

impl DualityReport {
    /// Gap relative to the primal magnitude (at least 1).
    pub fn relative_gap(&self) -> f64 {
        self.gap / self.primal.abs().max(1.0)
    }
}

/// How the fitted model scores new samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionFunction {
    /// `wᵀx + b`.
    Linear { weights: DVector<f64>, bias: f64 },
    /// `Σ_i c_i·(k(x_i, x) + K²)` over the support vectors.
    Kernel {
        kernel: Kernel,
        bias_sq: f64,
        support_vectors: DMatrix<f64>,
        coefficients: DVector<f64>,
    },
}

/// A fitted SVM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svm {
    decision: DecisionFunction,
    alpha: DVector<f64>,
    duality: DualityReport,
    summary: TrainingSummary,
}

impl Svm {
    /// Fit on `D × N` features with binary labels.
    pub fn fit(x: &DMatrix<f64>, labels: &[usize], config: &SvmConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let z = DVector::from_vec(signed_labels(labels, x.ncols())?);
        let bias_sq = config.bias * config.bias;

        let kernel_matrix = match &config.kernel {
            None => x.tr_mul(x),
            Some(kernel) => kernel.gram(x, x)?,
        };
        let h = (kernel_matrix.add_scalar(bias_sq)).component_mul(&(&z * z.transpose()));

        let dual = WithGradient::new(|alpha: &DVector<f64>| {
            let ha = &h * alpha;
            (0.5 * alpha.dot(&ha) - alpha.sum(), ha.add_scalar(-1.0))
        });
        let bounds = Bounds::uniform(x.ncols(), 0.0, config.c)?;
        let result = Lbfgs::new(config.optimizer.clone()).minimize(
            &dual,
            DVector::zeros(x.ncols()),
            &bounds,
        )?;
        let summary = TrainingSummary::from(&result);
        let alpha = result.x;

        let ha = &h * &alpha;
        let hinge: f64 = ha.iter().map(|&m| (1.0 - m).max(0.0)).sum();
        let primal = 0.5 * alpha.dot(&ha) + config.c * hinge;
        let dual_value = -summary.objective;
        let duality = DualityReport {
            primal,
            dual: dual_value,
            gap: primal - dual_value,
        };

        if !summary.converged() {
            warn!(
                status = ?summary.status,
                iterations = summary.iterations,
                "SVM dual stopped before convergence"
            );
        }
        if duality.relative_gap() > config.gap_tolerance {
            warn!(
                primal = duality.primal,
                dual = duality.dual,
                gap = duality.gap,
                tolerance = config.gap_tolerance,
                "large SVM duality gap"
            );
        }

        let coefficients = alpha.component_mul(&z);
        let decision = match config.kernel {
            None => {
                // ŵ = Σ α_i z_i [x_i; K]
                let weights = x * &coefficients;
                let bias = coefficients.sum() * bias_sq;
                DecisionFunction::Linear { weights, bias }
            }
            Some(kernel) => {
                let support: Vec<usize> = (0..alpha.len()).filter(|&i| alpha[i] > 0.0).collect();
                DecisionFunction::Kernel {
                    kernel,
                    bias_sq,
                    support_vectors: x.select_columns(support.iter()),
                    coefficients: DVector::from_iterator(
                        support.len(),
                        support.iter().map(|&i| coefficients[i]),
                    ),
                }
            }
        };

        info!(
            c = config.c,
            kernel = ?config.kernel,
            support_vectors = alpha.iter().filter(|&&a| a > 0.0).count(),
            primal = duality.primal,
            dual = duality.dual,
            gap = duality.gap,
            iterations = summary.iterations,
            "SVM fit"
        );

        Ok(Self {
            decision,
            alpha,
            duality,
            summary,
        })
    }

    pub fn decision_function(&self) -> &DecisionFunction {
        &self.decision
    }

    /// Dual coefficients, one per training sample.
    pub fn alpha(&self) -> &DVector<f64> {
        &self.alpha
    }

    pub fn duality(&self) -> &DualityReport {
        &self.duality
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    /// Number of training samples with `α_i > 0`.
    pub fn n_support(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > 0.0).count()
    }

    /// `(w, b)` of a linear SVM; `None` for kernel models.
    pub fn linear_weights(&self) -> Option<(&DVector<f64>, f64)> {
        match &self.decision {
            DecisionFunction::Linear { weights, bias } => Some((weights, *bias)),
            DecisionFunction::Kernel { .. } => None,
        }
    }
}

impl BinaryScorer for Svm {
    fn scores(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        match &self.decision {
            DecisionFunction::Linear { weights, bias } => {
                check_features("SVM input", x, weights.len())?;
                Ok(x.tr_mul(weights).iter().map(|s| s + bias).collect())
            }
            DecisionFunction::Kernel {
                kernel,
                bias_sq,
                support_vectors,
                coefficients,
            } => {
                check_features("SVM input", x, support_vectors.nrows())?;
                let k = kernel.gram(support_vectors, x)?.add_scalar(*bias_sq);
                Ok(k.tr_mul(coefficients).iter().copied().collect())
            }
        }
    }
}

/// Primal objective `½‖ŵ‖² + C·Σ max(0, 1 - z_i·ŵᵀx̂_i)` of a linear SVM with
/// `x̂ = [x; K]` and `ŵ = [w; b/K]`.
pub fn linear_primal_objective(
    weights: &DVector<f64>,
    bias: f64,
    x: &DMatrix<f64>,
    labels: &[usize],
    config: &SvmConfig,
) -> Result<f64, ModelError> {
    check_features("SVM input", x, weights.len())?;
    let z = signed_labels(labels, x.ncols())?;
    let b_hat = if config.bias > 0.0 { bias / config.bias } else { 0.0 };
    let s = x.tr_mul(weights);
    let hinge: f64 = (0..z.len())
        .map(|i| (1.0 - z[i] * (s[i] + bias)).max(0.0))
        .sum();
    Ok(0.5 * (weights.norm_squared() + b_hat * b_hat) + config.c * hinge)
}
