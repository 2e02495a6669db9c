//! # Optim - Box-Constrained Quasi-Newton Minimization
//!
//! One minimizer, [`Lbfgs`], and two ways to feed it:
//!
//! - [`WithGradient`]: the caller supplies `(f(x), ∇f(x))`
//! - [`ValueOnly`]: the caller supplies `f(x)`; the gradient is approximated
//!   by forward differences, and every probe counts as an evaluation
//!
//! Box constraints are given as [`Bounds`]; unconstrained problems use
//! [`Bounds::unbounded`]. The returned [`OptimizeResult`] always carries the
//! last point reached together with a [`Termination`] reason, so callers can
//! tell a converged solution from one cut short by a cap.
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::DVector;
//! use patrec_optim::{Bounds, Lbfgs, LbfgsOptions, ValueOnly};
//!
//! // Minimum of (x - 1)² + (y + 2)² at (1, -2)
//! let f = ValueOnly::new(|v: &DVector<f64>| (v[0] - 1.0).powi(2) + (v[1] + 2.0).powi(2));
//! let result = Lbfgs::new(LbfgsOptions::default())
//!     .minimize(&f, DVector::zeros(2), &Bounds::unbounded(2))
//!     .unwrap();
//! assert!((result.x[0] - 1.0).abs() < 1e-4);
//! assert!((result.x[1] + 2.0).abs() < 1e-4);
//! ```

pub mod bounds;
mod error;
pub mod lbfgs;
pub mod objective;

pub use bounds::Bounds;
pub use error::OptimError;
pub use lbfgs::{Lbfgs, LbfgsOptions, OptimizeResult, Termination};
pub use objective::{Objective, ValueOnly, WithGradient};
