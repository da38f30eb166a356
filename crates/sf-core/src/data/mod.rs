//! Columnar data tables shared by every model evaluation.

use std::collections::HashMap;

use crate::array::ArrayNamespace;
use crate::{Error, Result};

pub mod connect;

pub use connect::{FormatRegistry, IngestOptions};

/// Immutable column-oriented table of named per-row arrays.
///
/// Every column shares the same leading dimension. Availability masks use the
/// same type with indicator columns (`0.0` / `1.0`).
#[derive(Debug, Clone)]
pub struct Data<A: ArrayNamespace> {
    n_rows: usize,
    names: Vec<String>,
    columns: Vec<A::Array>,
    index: HashMap<String, usize>,
}

impl<A: ArrayNamespace> Data<A> {
    /// Create a table from plain column vectors, validating shape and values.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::Validation("Data requires at least one column".into()));
        }
        for (name, col) in &columns {
            if col.iter().any(|x| !x.is_finite()) {
                return Err(Error::Validation(format!(
                    "column '{name}' contains non-finite values"
                )));
            }
        }
        let arrays =
            columns.into_iter().map(|(name, col)| (name, A::from_vec(col))).collect::<Vec<_>>();
        Self::from_arrays(arrays)
    }

    /// Create a table from backend arrays.
    pub fn from_arrays(columns: Vec<(String, A::Array)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::Validation("Data requires at least one column".into()));
        }

        let n_rows = A::len(&columns[0].1);
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());

        for (pos, (name, col)) in columns.into_iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Validation("column names must be non-empty".into()));
            }
            let n = A::len(&col);
            if n != n_rows {
                return Err(Error::Validation(format!(
                    "column length mismatch for '{name}': expected {n_rows}, got {n}"
                )));
            }
            if index.insert(name.clone(), pos).is_some() {
                return Err(Error::Validation(format!("duplicate column name '{name}'")));
            }
            names.push(name);
            cols.push(col);
        }

        Ok(Self { n_rows, names, columns: cols, index })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Names of stored columns (stable order).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Result<&A::Array> {
        let idx = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| Error::KeyLookup(format!("no column '{name}'")))?;
        Ok(&self.columns[idx])
    }
}
