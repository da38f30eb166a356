//! Backend-agnostic array operations.
//!
//! Model code in this workspace never touches a concrete tensor type. It is
//! written against [`ArrayNamespace`], a capability trait implemented once per
//! numeric backend. An `Array` holds one value per data row; a `Matrix` is a
//! row-major block of per-row parameter columns.

use crate::{Error, Result};

mod cpu;
mod nalgebra;

pub use self::cpu::{CpuBackend, CpuMatrix};
pub use self::nalgebra::NalgebraBackend;

/// Capability surface every numeric backend must provide.
///
/// Masks are represented as indicator arrays: `0.0` is false, any other value
/// is true. This keeps the surface to a single array type per backend.
pub trait ArrayNamespace: Send + Sync + Sized + 'static {
    /// One value per data row.
    type Array: Clone + PartialEq + std::fmt::Debug + Send + Sync;
    /// Row-major block of per-row columns.
    type Matrix: Clone + std::fmt::Debug + Send + Sync;

    /// Additive identity of log-probabilities at excluded rows.
    const NEG_INF: f64 = f64::NEG_INFINITY;

    /// Build an array from a plain vector.
    fn from_vec(values: Vec<f64>) -> Self::Array;

    /// Copy an array out into a plain vector.
    fn to_vec(x: &Self::Array) -> Vec<f64>;

    /// Number of rows.
    fn len(x: &Self::Array) -> usize;

    /// All-zeros array of length `n`.
    fn zeros(n: usize) -> Self::Array;

    /// All-ones array of length `n`.
    fn ones(n: usize) -> Self::Array;

    /// All-zeros array with the shape of `x`.
    fn zeros_like(x: &Self::Array) -> Self::Array {
        Self::zeros(Self::len(x))
    }

    /// Constant array with the shape of `x`.
    fn full_like(x: &Self::Array, value: f64) -> Self::Array;

    /// Elementwise natural logarithm.
    fn log(x: &Self::Array) -> Self::Array;

    /// Elementwise exponential.
    fn exp(x: &Self::Array) -> Self::Array;

    /// Elementwise sum.
    fn add(x: &Self::Array, y: &Self::Array) -> Self::Array;

    /// Elementwise difference.
    fn sub(x: &Self::Array, y: &Self::Array) -> Self::Array;

    /// Elementwise product.
    fn mul(x: &Self::Array, y: &Self::Array) -> Self::Array;

    /// Sum of all entries.
    fn sum(x: &Self::Array) -> f64;

    /// True if any entry is non-zero.
    fn any(x: &Self::Array) -> bool;

    /// Indicator of `x < t`, elementwise.
    fn lt(x: &Self::Array, t: f64) -> Self::Array;

    /// Indicator of `lo <= x <= hi`, elementwise.
    fn within(x: &Self::Array, lo: f64, hi: f64) -> Self::Array;

    /// Copy of `x` with `value` written at rows where `mask` is non-zero.
    fn where_set(x: &Self::Array, mask: &Self::Array, value: f64) -> Self::Array;

    /// Build a matrix from row-major data.
    fn matrix_from_vec(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self::Matrix>;

    /// Matrix with `n_rows` rows and zero columns.
    fn matrix_empty(n_rows: usize) -> Self::Matrix;

    /// Number of matrix rows.
    fn n_rows(m: &Self::Matrix) -> usize;

    /// Number of matrix columns.
    fn n_cols(m: &Self::Matrix) -> usize;

    /// Stack equal-length arrays as the columns of a matrix.
    fn stack(columns: &[Self::Array]) -> Result<Self::Matrix>;

    /// Concatenate matrices along the column axis.
    fn concatenate(blocks: &[Self::Matrix]) -> Result<Self::Matrix>;

    /// Extract column `j`.
    fn column(m: &Self::Matrix, j: usize) -> Result<Self::Array>;

    /// Copy of `m` with column `j` replaced.
    fn with_column(m: &Self::Matrix, j: usize, col: &Self::Array) -> Result<Self::Matrix>;

    /// Row-wise `log(sum_j exp(m[i, j]))`, max-shifted for stability.
    ///
    /// A zero-column matrix reduces to `-inf` rows (an empty sum in
    /// probability space).
    fn logsumexp_rows(m: &Self::Matrix) -> Self::Array;

    /// Row-wise sum across columns.
    fn sum_rows(m: &Self::Matrix) -> Self::Array;
}

pub(crate) fn check_stack_lengths(lengths: &[usize]) -> Result<usize> {
    let Some(&first) = lengths.first() else {
        return Err(Error::Validation("cannot stack zero columns".into()));
    };
    for (j, &n) in lengths.iter().enumerate() {
        if n != first {
            return Err(Error::Validation(format!(
                "stack length mismatch: column 0 has {first} rows, column {j} has {n}"
            )));
        }
    }
    Ok(first)
}

pub(crate) fn check_concat_rows(rows: &[usize]) -> Result<usize> {
    let Some(&first) = rows.first() else {
        return Err(Error::Validation("cannot concatenate zero blocks".into()));
    };
    for (j, &n) in rows.iter().enumerate() {
        if n != first {
            return Err(Error::Validation(format!(
                "concatenate row mismatch: block 0 has {first} rows, block {j} has {n}"
            )));
        }
    }
    Ok(first)
}

/// Stable `log(sum_j exp(terms[j]))` over one row of stacked terms.
pub fn logsumexp(terms: &[f64]) -> f64 {
    let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        // Every term underflows; the sum is empty in probability space.
        return f64::NEG_INFINITY;
    }
    let sum: f64 = terms.iter().map(|&t| (t - max).exp()).sum();
    max + sum.ln()
}
