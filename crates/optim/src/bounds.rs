//! Box constraints `l ≤ x ≤ u`.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::OptimError;

/// Per-coordinate lower and upper bounds. Infinite bounds are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Validated bounds; every `lower[i] <= upper[i]`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, OptimError> {
        if lower.len() != upper.len() {
            return Err(OptimError::DimensionMismatch {
                expected: lower.len(),
                got: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo <= hi) {
                return Err(OptimError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// No constraint on any of the `n` coordinates.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// The same interval `[lower, upper]` for all `n` coordinates.
    pub fn uniform(n: usize, lower: f64, upper: f64) -> Result<Self, OptimError> {
        Self::new(vec![lower; n], vec![upper; n])
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Clamp every coordinate into its interval.
    pub fn project(&self, x: &mut DVector<f64>) {
        for (i, v) in x.iter_mut().enumerate() {
            *v = v.clamp(self.lower[i], self.upper[i]);
        }
    }

    /// `P(x - g) - x`: the step a unit projected-gradient move would take.
    ///
    /// Its infinity norm is zero exactly at a first-order stationary point
    /// of the constrained problem.
    pub fn projected_gradient(&self, x: &DVector<f64>, g: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(x.len(), |i, _| {
            (x[i] - g[i]).clamp(self.lower[i], self.upper[i]) - x[i]
        })
    }

    /// Whether coordinate `i` sits on a bound with the gradient pushing it
    /// outward, so no descent step can move it.
    pub fn is_blocked(&self, i: usize, x: f64, g: f64) -> bool {
        (x <= self.lower[i] && g > 0.0) || (x >= self.upper[i] && g < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::new(vec![0.0, 1.0], vec![1.0, 0.0]).is_err());
        assert!(Bounds::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(Bounds::uniform(3, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_project_clamps() {
        let b = Bounds::uniform(3, 0.0, 1.0).unwrap();
        let mut x = DVector::from_vec(vec![-0.5, 0.5, 1.5]);
        b.project(&mut x);
        assert_eq!(x, DVector::from_vec(vec![0.0, 0.5, 1.0]));
    }

    #[test]
    fn test_projected_gradient_at_bounds() {
        let b = Bounds::uniform(2, 0.0, 1.0).unwrap();
        let x = DVector::from_vec(vec![0.0, 0.5]);
        // Pushing outward at the lower bound is blocked
        let pg = b.projected_gradient(&x, &DVector::from_vec(vec![2.0, 0.1]));
        assert_eq!(pg[0], 0.0);
        assert!((pg[1] + 0.1).abs() < 1e-12);
        assert!(b.is_blocked(0, 0.0, 2.0));
        assert!(!b.is_blocked(0, 0.0, -2.0));
    }

    #[test]
    fn test_unbounded_projected_gradient_is_negative_gradient() {
        let b = Bounds::unbounded(2);
        let x = DVector::from_vec(vec![3.0, -3.0]);
        let g = DVector::from_vec(vec![1.0, -2.0]);
        assert_eq!(b.projected_gradient(&x, &g), -g);
    }
}
