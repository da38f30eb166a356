//! Plain-`Vec` CPU backend.

use rayon::prelude::*;

use super::{check_concat_rows, check_stack_lengths, logsumexp, ArrayNamespace};
use crate::{Error, Result};

/// Row-major dense matrix for [`CpuBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct CpuMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl CpuMatrix {
    fn new(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(Error::Validation(format!(
                "matrix data length mismatch: expected {}x{} = {}, got {}",
                n_rows,
                n_cols,
                n_rows * n_cols,
                data.len()
            )));
        }
        Ok(Self { data, n_rows, n_cols })
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }
}

/// Reference backend over `Vec<f64>` with rayon row-parallel reductions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl ArrayNamespace for CpuBackend {
    type Array = Vec<f64>;
    type Matrix = CpuMatrix;

    fn from_vec(values: Vec<f64>) -> Vec<f64> {
        values
    }

    fn to_vec(x: &Vec<f64>) -> Vec<f64> {
        x.clone()
    }

    fn len(x: &Vec<f64>) -> usize {
        x.len()
    }

    fn zeros(n: usize) -> Vec<f64> {
        vec![0.0; n]
    }

    fn ones(n: usize) -> Vec<f64> {
        vec![1.0; n]
    }

    fn full_like(x: &Vec<f64>, value: f64) -> Vec<f64> {
        vec![value; x.len()]
    }

    fn log(x: &Vec<f64>) -> Vec<f64> {
        x.iter().map(|v| v.ln()).collect()
    }

    fn exp(x: &Vec<f64>) -> Vec<f64> {
        x.iter().map(|v| v.exp()).collect()
    }

    fn add(x: &Vec<f64>, y: &Vec<f64>) -> Vec<f64> {
        debug_assert_eq!(x.len(), y.len());
        x.iter().zip(y).map(|(a, b)| a + b).collect()
    }

    fn sub(x: &Vec<f64>, y: &Vec<f64>) -> Vec<f64> {
        debug_assert_eq!(x.len(), y.len());
        x.iter().zip(y).map(|(a, b)| a - b).collect()
    }

    fn mul(x: &Vec<f64>, y: &Vec<f64>) -> Vec<f64> {
        debug_assert_eq!(x.len(), y.len());
        x.iter().zip(y).map(|(a, b)| a * b).collect()
    }

    fn sum(x: &Vec<f64>) -> f64 {
        x.par_iter().sum()
    }

    fn any(x: &Vec<f64>) -> bool {
        x.iter().any(|v| *v != 0.0)
    }

    fn lt(x: &Vec<f64>, t: f64) -> Vec<f64> {
        x.iter().map(|&v| if v < t { 1.0 } else { 0.0 }).collect()
    }

    fn within(x: &Vec<f64>, lo: f64, hi: f64) -> Vec<f64> {
        x.iter().map(|&v| if lo <= v && v <= hi { 1.0 } else { 0.0 }).collect()
    }

    fn where_set(x: &Vec<f64>, mask: &Vec<f64>, value: f64) -> Vec<f64> {
        debug_assert_eq!(x.len(), mask.len());
        x.iter().zip(mask).map(|(&v, &m)| if m != 0.0 { value } else { v }).collect()
    }

    fn matrix_from_vec(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<CpuMatrix> {
        CpuMatrix::new(data, n_rows, n_cols)
    }

    fn matrix_empty(n_rows: usize) -> CpuMatrix {
        CpuMatrix { data: Vec::new(), n_rows, n_cols: 0 }
    }

    fn n_rows(m: &CpuMatrix) -> usize {
        m.n_rows
    }

    fn n_cols(m: &CpuMatrix) -> usize {
        m.n_cols
    }

    fn stack(columns: &[Vec<f64>]) -> Result<CpuMatrix> {
        let lengths: Vec<usize> = columns.iter().map(Vec::len).collect();
        let n = check_stack_lengths(&lengths)?;
        let k = columns.len();
        let mut data = vec![0.0; n * k];
        for (j, col) in columns.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                data[i * k + j] = v;
            }
        }
        CpuMatrix::new(data, n, k)
    }

    fn concatenate(blocks: &[CpuMatrix]) -> Result<CpuMatrix> {
        let rows: Vec<usize> = blocks.iter().map(|b| b.n_rows).collect();
        let n = check_concat_rows(&rows)?;
        let k: usize = blocks.iter().map(|b| b.n_cols).sum();
        let mut data = Vec::with_capacity(n * k);
        for i in 0..n {
            for b in blocks {
                data.extend_from_slice(b.row(i));
            }
        }
        CpuMatrix::new(data, n, k)
    }

    fn column(m: &CpuMatrix, j: usize) -> Result<Vec<f64>> {
        if j >= m.n_cols {
            return Err(Error::Validation(format!(
                "column index out of range: {j} >= {}",
                m.n_cols
            )));
        }
        Ok((0..m.n_rows).map(|i| m.data[i * m.n_cols + j]).collect())
    }

    fn with_column(m: &CpuMatrix, j: usize, col: &Vec<f64>) -> Result<CpuMatrix> {
        if j >= m.n_cols {
            return Err(Error::Validation(format!(
                "column index out of range: {j} >= {}",
                m.n_cols
            )));
        }
        if col.len() != m.n_rows {
            return Err(Error::Validation(format!(
                "column length mismatch: expected {}, got {}",
                m.n_rows,
                col.len()
            )));
        }
        let mut out = m.clone();
        for (i, &v) in col.iter().enumerate() {
            out.data[i * out.n_cols + j] = v;
        }
        Ok(out)
    }

    fn logsumexp_rows(m: &CpuMatrix) -> Vec<f64> {
        (0..m.n_rows).map(|i| logsumexp(m.row(i))).collect()
    }

    fn sum_rows(m: &CpuMatrix) -> Vec<f64> {
        (0..m.n_rows).map(|i| m.row(i).iter().sum()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stack_and_column_roundtrip() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let m = CpuBackend::stack(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(CpuBackend::n_rows(&m), 3);
        assert_eq!(CpuBackend::n_cols(&m), 2);
        assert_eq!(CpuBackend::column(&m, 0).unwrap(), a);
        assert_eq!(CpuBackend::column(&m, 1).unwrap(), b);
    }

    #[test]
    fn test_stack_rejects_length_mismatch() {
        let err = CpuBackend::stack(&[vec![1.0], vec![1.0, 2.0]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_concatenate_preserves_block_order() {
        let left = CpuBackend::stack(&[vec![1.0, 2.0]]).unwrap();
        let right = CpuBackend::stack(&[vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let m = CpuBackend::concatenate(&[left, right]).unwrap();
        assert_eq!(CpuBackend::n_cols(&m), 3);
        assert_eq!(CpuBackend::column(&m, 0).unwrap(), vec![1.0, 2.0]);
        assert_eq!(CpuBackend::column(&m, 2).unwrap(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_concatenate_skips_nothing_with_zero_width_block() {
        let empty = CpuBackend::matrix_empty(2);
        let right = CpuBackend::stack(&[vec![3.0, 4.0]]).unwrap();
        let m = CpuBackend::concatenate(&[empty, right]).unwrap();
        assert_eq!(CpuBackend::n_cols(&m), 1);
        assert_eq!(CpuBackend::column(&m, 0).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_logsumexp_rows_single_column_is_identity() {
        let m = CpuBackend::stack(&[vec![-1.5, -2.5]]).unwrap();
        let out = CpuBackend::logsumexp_rows(&m);
        assert_relative_eq!(out[0], -1.5, epsilon = 1e-12);
        assert_relative_eq!(out[1], -2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_logsumexp_rows_zero_columns_is_neg_inf() {
        let m = CpuBackend::matrix_empty(3);
        let out = CpuBackend::logsumexp_rows(&m);
        assert!(out.iter().all(|v| *v == f64::NEG_INFINITY));
    }

    #[test]
    fn test_constructors_track_shape() {
        let x = vec![1.0, 2.0];
        assert_eq!(CpuBackend::zeros_like(&x), vec![0.0, 0.0]);
        assert_eq!(CpuBackend::full_like(&x, 3.5), vec![3.5, 3.5]);
        assert_eq!(CpuBackend::ones(3), vec![1.0; 3]);
    }

    #[test]
    fn test_where_set_and_indicators() {
        let x = vec![0.1, 0.5, 0.9];
        let mask = CpuBackend::within(&x, 0.4, 1.0);
        assert_eq!(mask, vec![0.0, 1.0, 1.0]);
        let out = CpuBackend::where_set(&x, &mask, f64::NEG_INFINITY);
        assert_eq!(out[0], 0.1);
        assert_eq!(out[1], f64::NEG_INFINITY);
        assert!(CpuBackend::any(&mask));
        assert!(!CpuBackend::any(&CpuBackend::zeros(3)));
    }
}
