//! Dense-matrix backend over `nalgebra`.

use nalgebra::{DMatrix, DVector};

use super::{check_concat_rows, check_stack_lengths, logsumexp, ArrayNamespace};
use crate::{Error, Result};

/// Backend over `nalgebra::DVector` / `nalgebra::DMatrix`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraBackend;

impl ArrayNamespace for NalgebraBackend {
    type Array = DVector<f64>;
    type Matrix = DMatrix<f64>;

    fn from_vec(values: Vec<f64>) -> DVector<f64> {
        DVector::from_vec(values)
    }

    fn to_vec(x: &DVector<f64>) -> Vec<f64> {
        x.iter().copied().collect()
    }

    fn len(x: &DVector<f64>) -> usize {
        x.len()
    }

    fn zeros(n: usize) -> DVector<f64> {
        DVector::zeros(n)
    }

    fn ones(n: usize) -> DVector<f64> {
        DVector::from_element(n, 1.0)
    }

    fn full_like(x: &DVector<f64>, value: f64) -> DVector<f64> {
        DVector::from_element(x.len(), value)
    }

    fn log(x: &DVector<f64>) -> DVector<f64> {
        x.map(f64::ln)
    }

    fn exp(x: &DVector<f64>) -> DVector<f64> {
        x.map(f64::exp)
    }

    fn add(x: &DVector<f64>, y: &DVector<f64>) -> DVector<f64> {
        x + y
    }

    fn sub(x: &DVector<f64>, y: &DVector<f64>) -> DVector<f64> {
        x - y
    }

    fn mul(x: &DVector<f64>, y: &DVector<f64>) -> DVector<f64> {
        x.component_mul(y)
    }

    fn sum(x: &DVector<f64>) -> f64 {
        x.sum()
    }

    fn any(x: &DVector<f64>) -> bool {
        x.iter().any(|v| *v != 0.0)
    }

    fn lt(x: &DVector<f64>, t: f64) -> DVector<f64> {
        x.map(|v| if v < t { 1.0 } else { 0.0 })
    }

    fn within(x: &DVector<f64>, lo: f64, hi: f64) -> DVector<f64> {
        x.map(|v| if lo <= v && v <= hi { 1.0 } else { 0.0 })
    }

    fn where_set(x: &DVector<f64>, mask: &DVector<f64>, value: f64) -> DVector<f64> {
        x.zip_map(mask, |v, m| if m != 0.0 { value } else { v })
    }

    fn matrix_from_vec(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<DMatrix<f64>> {
        if data.len() != n_rows * n_cols {
            return Err(Error::Validation(format!(
                "matrix data length mismatch: expected {}x{} = {}, got {}",
                n_rows,
                n_cols,
                n_rows * n_cols,
                data.len()
            )));
        }
        Ok(DMatrix::from_row_slice(n_rows, n_cols, &data))
    }

    fn matrix_empty(n_rows: usize) -> DMatrix<f64> {
        DMatrix::zeros(n_rows, 0)
    }

    fn n_rows(m: &DMatrix<f64>) -> usize {
        m.nrows()
    }

    fn n_cols(m: &DMatrix<f64>) -> usize {
        m.ncols()
    }

    fn stack(columns: &[DVector<f64>]) -> Result<DMatrix<f64>> {
        let lengths: Vec<usize> = columns.iter().map(DVector::len).collect();
        let n = check_stack_lengths(&lengths)?;
        Ok(DMatrix::from_fn(n, columns.len(), |i, j| columns[j][i]))
    }

    fn concatenate(blocks: &[DMatrix<f64>]) -> Result<DMatrix<f64>> {
        let rows: Vec<usize> = blocks.iter().map(DMatrix::nrows).collect();
        let n = check_concat_rows(&rows)?;
        let k: usize = blocks.iter().map(DMatrix::ncols).sum();
        let mut out = DMatrix::zeros(n, k);
        let mut offset = 0;
        for b in blocks {
            for j in 0..b.ncols() {
                out.set_column(offset + j, &b.column(j));
            }
            offset += b.ncols();
        }
        Ok(out)
    }

    fn column(m: &DMatrix<f64>, j: usize) -> Result<DVector<f64>> {
        if j >= m.ncols() {
            return Err(Error::Validation(format!(
                "column index out of range: {j} >= {}",
                m.ncols()
            )));
        }
        Ok(m.column(j).into_owned())
    }

    fn with_column(m: &DMatrix<f64>, j: usize, col: &DVector<f64>) -> Result<DMatrix<f64>> {
        if j >= m.ncols() {
            return Err(Error::Validation(format!(
                "column index out of range: {j} >= {}",
                m.ncols()
            )));
        }
        if col.len() != m.nrows() {
            return Err(Error::Validation(format!(
                "column length mismatch: expected {}, got {}",
                m.nrows(),
                col.len()
            )));
        }
        let mut out = m.clone();
        out.set_column(j, col);
        Ok(out)
    }

    fn logsumexp_rows(m: &DMatrix<f64>) -> DVector<f64> {
        let mut terms = vec![0.0; m.ncols()];
        DVector::from_fn(m.nrows(), |i, _| {
            for (j, t) in terms.iter_mut().enumerate() {
                *t = m[(i, j)];
            }
            logsumexp(&terms)
        })
    }

    fn sum_rows(m: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(m.nrows(), |i, _| m.row(i).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::CpuBackend;
    use approx::assert_relative_eq;

    // The two backends must agree on the shared capability surface.
    #[test]
    fn test_parity_with_cpu_backend() {
        let cols = [vec![-1.0, -2.0, -800.0], vec![-2.0, -2.0, -801.0]];

        let cpu = CpuBackend::stack(&cols).unwrap();
        let na = NalgebraBackend::stack(&[
            NalgebraBackend::from_vec(cols[0].clone()),
            NalgebraBackend::from_vec(cols[1].clone()),
        ])
        .unwrap();

        let lse_cpu = CpuBackend::logsumexp_rows(&cpu);
        let lse_na = NalgebraBackend::to_vec(&NalgebraBackend::logsumexp_rows(&na));
        let sum_cpu = CpuBackend::sum_rows(&cpu);
        let sum_na = NalgebraBackend::to_vec(&NalgebraBackend::sum_rows(&na));
        for i in 0..3 {
            assert_relative_eq!(lse_cpu[i], lse_na[i], epsilon = 1e-12);
            assert_relative_eq!(sum_cpu[i], sum_na[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_where_set_parity() {
        let x = vec![0.1, 0.5, 0.9];
        let cpu_mask = CpuBackend::within(&x, 0.4, 1.0);
        let cpu = CpuBackend::where_set(&x, &cpu_mask, 7.0);

        let xv = NalgebraBackend::from_vec(x);
        let na_mask = NalgebraBackend::within(&xv, 0.4, 1.0);
        let na = NalgebraBackend::to_vec(&NalgebraBackend::where_set(&xv, &na_mask, 7.0));
        assert_eq!(cpu, na);
    }

    #[test]
    fn test_concatenate_column_offsets() {
        let a = NalgebraBackend::stack(&[NalgebraBackend::from_vec(vec![1.0, 2.0])]).unwrap();
        let b = NalgebraBackend::stack(&[
            NalgebraBackend::from_vec(vec![3.0, 4.0]),
            NalgebraBackend::from_vec(vec![5.0, 6.0]),
        ])
        .unwrap();
        let m = NalgebraBackend::concatenate(&[a, b]).unwrap();
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(1, 2)], 6.0);
    }
}
