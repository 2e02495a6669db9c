//! Numerically stable log-space helpers.

use nalgebra::{DMatrix, DVector};

/// `ln(Σ exp(v))` without overflow.
///
/// Returns `-inf` for an empty input or when every term is `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Column-wise log-sum-exp of a `K × N` matrix: one value per column.
pub fn log_sum_exp_columns(m: &DMatrix<f64>) -> DVector<f64> {
    let mut buffer = Vec::with_capacity(m.nrows());
    DVector::from_iterator(
        m.ncols(),
        m.column_iter().map(|col| {
            buffer.clear();
            buffer.extend(col.iter().copied());
            log_sum_exp(&buffer)
        }),
    )
}

/// `ln(1 + exp(x))`, the logistic loss kernel.
pub fn log1p_exp(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Logistic sigmoid `1 / (1 + exp(-x))`.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
