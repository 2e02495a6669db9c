//! Objective providers.
//!
//! The minimizer only ever asks an objective for `(f(x), ∇f(x))`. Whether
//! the gradient is analytic or approximated is decided by the caller when
//! choosing the provider, not by a flag inside the objective:
//!
//! - [`WithGradient`] wraps a closure that returns both value and gradient
//! - [`ValueOnly`] wraps a closure that returns the value only and
//!   approximates the gradient with forward differences
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DVector;
//! use patrec_optim::{Objective, ValueOnly, WithGradient};
//!
//! let exact = WithGradient::new(|x: &DVector<f64>| (x.norm_squared(), x * 2.0));
//! let approx = ValueOnly::new(|x: &DVector<f64>| x.norm_squared());
//!
//! let x = DVector::from_vec(vec![1.0, -2.0]);
//! let (_, g_exact) = exact.evaluate(&x);
//! let (_, g_approx) = approx.evaluate(&x);
//! assert!((g_exact - g_approx).amax() < 1e-5);
//! ```

use nalgebra::DVector;

/// Default forward-difference step.
pub const FD_EPSILON: f64 = 1e-8;

/// A differentiable scalar function of a real vector.
pub trait Objective {
    /// Value and gradient at `x`.
    fn evaluate(&self, x: &DVector<f64>) -> (f64, DVector<f64>);

    /// Number of function evaluations one call to [`evaluate`](Self::evaluate)
    /// costs for an `n`-dimensional point.
    fn evaluations_per_call(&self, _n: usize) -> usize {
        1
    }
}

/// An objective with an analytic gradient.
#[derive(Debug, Clone)]
pub struct WithGradient<F> {
    f: F,
}

impl<F> WithGradient<F>
where
    F: Fn(&DVector<f64>) -> (f64, DVector<f64>),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Objective for WithGradient<F>
where
    F: Fn(&DVector<f64>) -> (f64, DVector<f64>),
{
    fn evaluate(&self, x: &DVector<f64>) -> (f64, DVector<f64>) {
        (self.f)(x)
    }
}

/// A value-only objective; the gradient is approximated by forward
/// differences `(f(x + ε·e_i) - f(x)) / ε`.
#[derive(Debug, Clone)]
pub struct ValueOnly<F> {
    f: F,
    epsilon: f64,
}

impl<F> ValueOnly<F>
where
    F: Fn(&DVector<f64>) -> f64,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            epsilon: FD_EPSILON,
        }
    }

    /// Use a custom difference step.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// The value alone, without the difference probes.
    pub fn value(&self, x: &DVector<f64>) -> f64 {
        (self.f)(x)
    }
}

impl<F> Objective for ValueOnly<F>
where
    F: Fn(&DVector<f64>) -> f64,
{
    fn evaluate(&self, x: &DVector<f64>) -> (f64, DVector<f64>) {
        let f0 = (self.f)(x);
        let mut probe = x.clone();
        let mut grad = DVector::zeros(x.len());
        for i in 0..x.len() {
            let original = probe[i];
            probe[i] = original + self.epsilon;
            grad[i] = ((self.f)(&probe) - f0) / self.epsilon;
            probe[i] = original;
        }
        (f0, grad)
    }

    fn evaluations_per_call(&self, n: usize) -> usize {
        n + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rosenbrock(x: &DVector<f64>) -> f64 {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    }

    #[test]
    fn test_forward_difference_matches_analytic() {
        let x = DVector::from_vec(vec![-1.2, 1.0]);
        let (_, g) = ValueOnly::new(rosenbrock).evaluate(&x);
        let analytic = [
            -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
            200.0 * (x[1] - x[0] * x[0]),
        ];
        assert!((g[0] - analytic[0]).abs() < 1e-3);
        assert!((g[1] - analytic[1]).abs() < 1e-3);
    }

    #[test]
    fn test_evaluation_cost() {
        let v = ValueOnly::new(rosenbrock);
        let w = WithGradient::new(|x: &DVector<f64>| (0.0, x.clone()));
        assert_eq!(v.evaluations_per_call(2), 3);
        assert_eq!(w.evaluations_per_call(2), 1);
    }

    #[test]
    fn test_value_only_leaves_value_untouched() {
        let x = DVector::from_vec(vec![0.5, 0.5]);
        let v = ValueOnly::new(rosenbrock).with_epsilon(1e-6);
        let (f, _) = v.evaluate(&x);
        assert_eq!(f, v.value(&x));
    }
}
