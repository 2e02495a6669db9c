//! Limited-memory BFGS with box constraints.
//!
//! The search direction comes from the usual two-loop recursion over the
//! last `memory` curvature pairs, restricted to the coordinates that are
//! free to move. Coordinates pinned against a bound by the gradient are
//! frozen for the step. Steps are projected back onto the box and accepted
//! by a backtracking Armijo test along the projected path.
//!
//! Stopping tests, checked after every iteration:
//!
//! - `‖P(x - g) - x‖∞ ≤ pgtol` (projected-gradient stationarity)
//! - `(f_k - f_{k+1}) / max(|f_k|, |f_{k+1}|, 1) ≤ factr · ε_mach`
//!   (relative reduction; disabled when `factr` is `None`)
//! - iteration and function-evaluation caps
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DVector;
//! use patrec_optim::{Bounds, Lbfgs, LbfgsOptions, WithGradient};
//!
//! // min (x - 3)² subject to 0 ≤ x ≤ 2
//! let objective = WithGradient::new(|x: &DVector<f64>| {
//!     let d = x[0] - 3.0;
//!     (d * d, DVector::from_element(1, 2.0 * d))
//! });
//! let bounds = Bounds::uniform(1, 0.0, 2.0).unwrap();
//! let result = Lbfgs::new(LbfgsOptions::default())
//!     .minimize(&objective, DVector::zeros(1), &bounds)
//!     .unwrap();
//!
//! assert!((result.x[0] - 2.0).abs() < 1e-9);
//! assert!(result.converged());
//! ```

use std::collections::VecDeque;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounds::Bounds;
use crate::error::OptimError;
use crate::objective::Objective;

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const CURVATURE_EPS: f64 = 1e-10;

/// L-BFGS hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LbfgsOptions {
    /// Number of curvature pairs kept.
    pub memory: usize,
    /// Cap on iterations.
    pub max_iterations: usize,
    /// Cap on function evaluations, finite-difference probes included.
    pub max_evaluations: usize,
    /// Relative-reduction factor, in units of machine epsilon.
    pub factr: Option<f64>,
    /// Projected-gradient tolerance.
    pub pgtol: f64,
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iterations: 15000,
            max_evaluations: 15000,
            factr: Some(1e7),
            pgtol: 1e-5,
        }
    }
}

impl LbfgsOptions {
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    pub fn with_factr(mut self, factr: Option<f64>) -> Self {
        self.factr = factr;
        self
    }

    pub fn with_pgtol(mut self, pgtol: f64) -> Self {
        self.pgtol = pgtol;
        self
    }

    fn validate(&self) -> Result<(), OptimError> {
        if self.memory == 0 {
            return Err(invalid("memory", "must keep at least one pair"));
        }
        if !(self.pgtol >= 0.0) {
            return Err(invalid("pgtol", "must be non-negative"));
        }
        if let Some(f) = self.factr {
            if !(f >= 0.0) {
                return Err(invalid("factr", "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Projected gradient below `pgtol`.
    ProjectedGradient,
    /// Relative objective reduction below `factr · ε_mach`.
    RelativeReduction,
    /// Iteration cap reached.
    MaxIterations,
    /// Function-evaluation cap reached.
    MaxEvaluations,
    /// No step along the search direction decreased the objective.
    LineSearchFailed,
}

impl Termination {
    /// Whether a stopping tolerance was met.
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Termination::ProjectedGradient | Termination::RelativeReduction
        )
    }
}

/// Outcome of a minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResult {
    /// Best point found.
    pub x: DVector<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Gradient at `x`.
    pub gradient: DVector<f64>,
    /// `‖P(x - g) - x‖∞` at `x`.
    pub projected_gradient_norm: f64,
    pub iterations: usize,
    /// Function evaluations, finite-difference probes included.
    pub evaluations: usize,
    pub status: Termination,
}

impl OptimizeResult {
    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }
}

/// Projected L-BFGS minimizer.
#[derive(Debug, Clone, Default)]
pub struct Lbfgs {
    options: LbfgsOptions,
}

impl Lbfgs {
    pub fn new(options: LbfgsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LbfgsOptions {
        &self.options
    }

    /// Minimize `objective` from `x0` (projected onto `bounds` first).
    ///
    /// Hitting an iteration or evaluation cap is not an error: the result
    /// carries the last point and a non-converged [`Termination`].
    pub fn minimize<O: Objective>(
        &self,
        objective: &O,
        x0: DVector<f64>,
        bounds: &Bounds,
    ) -> Result<OptimizeResult, OptimError> {
        self.options.validate()?;
        let n = x0.len();
        if bounds.len() != n {
            return Err(OptimError::DimensionMismatch {
                expected: n,
                got: bounds.len(),
            });
        }

        let cost = objective.evaluations_per_call(n);
        let mut x = x0;
        bounds.project(&mut x);
        let (mut f, mut g) = objective.evaluate(&x);
        let mut evaluations = cost;
        if g.len() != n {
            return Err(OptimError::DimensionMismatch {
                expected: n,
                got: g.len(),
            });
        }
        if !f.is_finite() {
            return Err(OptimError::NonFiniteStart { value: f });
        }

        let mut history: VecDeque<(DVector<f64>, DVector<f64>)> =
            VecDeque::with_capacity(self.options.memory);
        let mut iterations = 0;

        let status = loop {
            if bounds.projected_gradient(&x, &g).amax() <= self.options.pgtol {
                break Termination::ProjectedGradient;
            }
            if iterations >= self.options.max_iterations {
                break Termination::MaxIterations;
            }
            if evaluations + cost > self.options.max_evaluations {
                break Termination::MaxEvaluations;
            }

            let free: Vec<bool> = (0..n).map(|i| !bounds.is_blocked(i, x[i], g[i])).collect();
            let mut d = two_loop(&g, &history, &free);
            if g.dot(&d) >= 0.0 {
                // Not a descent direction: restart from steepest descent
                history.clear();
                d = masked(&(-&g), &free);
            }

            // First step of a fresh memory is scaled to unit length
            let mut step = if history.is_empty() {
                (1.0 / d.amax()).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut candidate = &x + &d * step;
                bounds.project(&mut candidate);
                let (fc, gc) = objective.evaluate(&candidate);
                evaluations += cost;
                let decrease = g.dot(&(&candidate - &x));
                if fc.is_finite() && fc <= f + ARMIJO_C1 * decrease {
                    accepted = Some((candidate, fc, gc));
                    break;
                }
                if evaluations + cost > self.options.max_evaluations {
                    break;
                }
                step *= 0.5;
            }

            let Some((x_new, f_new, g_new)) = accepted else {
                break if evaluations + cost > self.options.max_evaluations {
                    Termination::MaxEvaluations
                } else {
                    Termination::LineSearchFailed
                };
            };

            let s = &x_new - &x;
            let y = &g_new - &g;
            if s.dot(&y) > CURVATURE_EPS * y.dot(&y) {
                if history.len() == self.options.memory {
                    history.pop_front();
                }
                history.push_back((s, y));
            }

            let reduction = (f - f_new) / f.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            f = f_new;
            g = g_new;
            iterations += 1;

            if iterations % 100 == 0 {
                debug!(iteration = iterations, value = f, evaluations, "L-BFGS progress");
            }
            if let Some(factr) = self.options.factr {
                if reduction <= factr * f64::EPSILON {
                    break Termination::RelativeReduction;
                }
            }
        };

        let projected_gradient_norm = bounds.projected_gradient(&x, &g).amax();
        if status.is_converged() {
            debug!(?status, iterations, evaluations, value = f, "L-BFGS finished");
        } else {
            warn!(
                ?status,
                iterations,
                evaluations,
                value = f,
                projected_gradient_norm,
                "L-BFGS stopped before meeting its tolerance"
            );
        }

        Ok(OptimizeResult {
            x,
            value: f,
            gradient: g,
            projected_gradient_norm,
            iterations,
            evaluations,
            status,
        })
    }
}

/// `-H·g` on the free coordinates, zero on the frozen ones.
fn two_loop(
    g: &DVector<f64>,
    history: &VecDeque<(DVector<f64>, DVector<f64>)>,
    free: &[bool],
) -> DVector<f64> {
    let mut q = masked(g, free);
    let mut alphas = Vec::with_capacity(history.len());

    for (s, y) in history.iter().rev() {
        let rho = 1.0 / y.dot(s);
        let a = rho * s.dot(&q);
        q.axpy(-a, y, 1.0);
        alphas.push((a, rho));
    }

    let gamma = history
        .back()
        .map_or(1.0, |(s, y)| s.dot(y) / y.dot(y));
    let mut r = q * gamma;

    for ((s, y), (a, rho)) in history.iter().zip(alphas.into_iter().rev()) {
        let b = rho * y.dot(&r);
        r.axpy(a - b, s, 1.0);
    }
    -masked(&r, free)
}

fn masked(v: &DVector<f64>, free: &[bool]) -> DVector<f64> {
    DVector::from_fn(v.len(), |i, _| if free[i] { v[i] } else { 0.0 })
}

fn invalid(name: &str, reason: &str) -> OptimError {
    OptimError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{ValueOnly, WithGradient};

    fn quadratic() -> WithGradient<impl Fn(&DVector<f64>) -> (f64, DVector<f64>)> {
        // f(x) = ½ xᵀAx - bᵀx with A = diag(1, 10)
        WithGradient::new(|x: &DVector<f64>| {
            let a = DVector::from_vec(vec![1.0, 10.0]);
            let b = DVector::from_vec(vec![1.0, 1.0]);
            let ax = x.component_mul(&a);
            (0.5 * x.dot(&ax) - b.dot(x), ax - b)
        })
    }

    #[test]
    fn test_unconstrained_quadratic() {
        let result = Lbfgs::default()
            .minimize(&quadratic(), DVector::from_vec(vec![5.0, 5.0]), &Bounds::unbounded(2))
            .unwrap();
        assert!(result.converged());
        assert!((result.x[0] - 1.0).abs() < 1e-3);
        assert!((result.x[1] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_box_constrained_quadratic() {
        // Unconstrained optimum (1, 0.1) is outside x₀ ≤ 0.5
        let bounds = Bounds::new(vec![f64::NEG_INFINITY, 0.0], vec![0.5, 1.0]).unwrap();
        let result = Lbfgs::default()
            .minimize(&quadratic(), DVector::zeros(2), &bounds)
            .unwrap();
        assert!((result.x[0] - 0.5).abs() < 1e-8);
        assert!((result.x[1] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_rosenbrock_value_only() {
        let objective = ValueOnly::new(|x: &DVector<f64>| {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        });
        let result = Lbfgs::new(LbfgsOptions::default().with_pgtol(1e-6))
            .minimize(&objective, DVector::from_vec(vec![-1.2, 1.0]), &Bounds::unbounded(2))
            .unwrap();
        assert!((result.x[0] - 1.0).abs() < 1e-3);
        assert!((result.x[1] - 1.0).abs() < 1e-3);
        // Every call costs n + 1 = 3 evaluations
        assert_eq!(result.evaluations % 3, 0);
    }

    #[test]
    fn test_evaluation_cap() {
        let objective = ValueOnly::new(|x: &DVector<f64>| {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        });
        let result = Lbfgs::new(LbfgsOptions::default().with_max_evaluations(12))
            .minimize(&objective, DVector::from_vec(vec![-1.2, 1.0]), &Bounds::unbounded(2))
            .unwrap();
        assert_eq!(result.status, Termination::MaxEvaluations);
        assert!(result.evaluations <= 12);
        assert!(!result.converged());
    }

    #[test]
    fn test_iteration_cap() {
        let result = Lbfgs::new(LbfgsOptions::default().with_max_iterations(1).with_factr(None))
            .minimize(&quadratic(), DVector::from_vec(vec![5.0, 5.0]), &Bounds::unbounded(2))
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.status, Termination::MaxIterations);
    }

    #[test]
    fn test_start_outside_box_is_projected() {
        let bounds = Bounds::uniform(2, -1.0, 1.0).unwrap();
        let result = Lbfgs::default()
            .minimize(&quadratic(), DVector::from_vec(vec![10.0, -10.0]), &bounds)
            .unwrap();
        assert!(result.x.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_non_finite_start() {
        let objective = WithGradient::new(|x: &DVector<f64>| (f64::NAN, x.clone()));
        let err = Lbfgs::default()
            .minimize(&objective, DVector::zeros(1), &Bounds::unbounded(1))
            .unwrap_err();
        assert!(matches!(err, OptimError::NonFiniteStart { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Lbfgs::default()
            .minimize(&quadratic(), DVector::zeros(2), &Bounds::unbounded(3))
            .unwrap_err();
        assert_eq!(err, OptimError::DimensionMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_options_serde_defaults() {
        let o: LbfgsOptions = serde_json::from_str(r#"{"factr": null, "max_evaluations": 20000}"#).unwrap();
        assert_eq!(o.factr, None);
        assert_eq!(o.max_evaluations, 20000);
        assert_eq!(o.memory, 10);
        assert_eq!(o.pgtol, 1e-5);
    }
}
