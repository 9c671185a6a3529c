use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Row-compressed sparse matrix of `f64` feature values.
///
/// Column indices inside each row are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

/// A borrowed view of one matrix row.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    indices: &'a [usize],
    values: &'a [f64],
}

impl SparseMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Appends a row. Entries may come in any order; zeros are dropped and
    /// duplicate columns are summed.
    pub fn push_row(&mut self, entries: impl IntoIterator<Item = (usize, f64)>) {
        let mut entries: Vec<(usize, f64)> = entries
            .into_iter()
            .filter(|&(_, v)| v != 0.0)
            .collect();
        entries.sort_by_key(|&(j, _)| j);

        let mut last: Option<usize> = None;
        for (j, v) in entries {
            if last == Some(j) {
                if let Some(slot) = self.values.last_mut() {
                    *slot += v;
                }
                continue;
            }
            self.n_cols = self.n_cols.max(j + 1);
            self.indices.push(j);
            self.values.push(v);
            last = Some(j);
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.values[start..end],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> + '_ {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// Builds a new matrix from the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> SparseMatrix {
        let mut out = SparseMatrix::new(self.n_cols);
        for &i in rows {
            let row = self.row(i);
            out.indices.extend_from_slice(row.indices);
            out.values.extend_from_slice(row.values);
            out.indptr.push(out.indices.len());
        }
        out
    }

    /// First stored negative value, as `(column, value)`.
    pub(crate) fn first_negative(&self) -> Option<(usize, f64)> {
        self.indices
            .iter()
            .zip(&self.values)
            .find(|&(_, &v)| v < 0.0)
            .map(|(&j, &v)| (j, v))
    }
}

impl<'a> SparseRow<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        let (indices, values) = (self.indices, self.values);
        indices.iter().copied().zip(values.iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Value at column `j`, zero when not stored.
    pub fn get(&self, j: usize) -> f64 {
        match self.indices.binary_search(&j) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense vector. Columns past its end count as zero.
    pub fn dot(&self, dense: ArrayView1<'_, f64>) -> f64 {
        self.iter()
            .filter(|&(j, _)| j < dense.len())
            .map(|(j, v)| v * dense[j])
            .sum()
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}
