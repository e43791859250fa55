use ndarray::{Array2, ArrayView2};

use crate::error::{ClassifierError, Result};
use crate::math::sparse::SparseVector;

/// Row-major collection of examples that can be fed to
/// [`Classifier::fit`](crate::models::Classifier::fit) and
/// [`Classifier::predict`](crate::models::Classifier::predict).
///
/// Implementations convert one row at a time into the sparse form the
/// classifier consumes, keeping only non-zero entries, so the numeric core
/// never sees a matrix representation.
pub trait RowSource {
    fn n_rows(&self) -> usize;

    fn sparse_row(&self, row: usize) -> Result<SparseVector>;
}

fn column_index(col: usize) -> Result<u32> {
    u32::try_from(col).map_err(|_| ClassifierError::UnsupportedFeature(col.to_string()))
}

fn dense_row<'a>(values: impl Iterator<Item = &'a f32>) -> Result<SparseVector> {
    let mut entries = Vec::new();
    for (col, &value) in values.enumerate() {
        if value != 0.0 {
            entries.push((column_index(col)?, value));
        }
    }
    Ok(SparseVector::from_unsorted(entries))
}

impl RowSource for ArrayView2<'_, f32> {
    fn n_rows(&self) -> usize {
        self.nrows()
    }

    fn sparse_row(&self, row: usize) -> Result<SparseVector> {
        dense_row(self.row(row).iter())
    }
}

impl RowSource for Array2<f32> {
    fn n_rows(&self) -> usize {
        self.nrows()
    }

    fn sparse_row(&self, row: usize) -> Result<SparseVector> {
        dense_row(self.row(row).iter())
    }
}

impl RowSource for [SparseVector] {
    fn n_rows(&self) -> usize {
        self.len()
    }

    fn sparse_row(&self, row: usize) -> Result<SparseVector> {
        Ok(self[row].clone())
    }
}

impl RowSource for Vec<SparseVector> {
    fn n_rows(&self) -> usize {
        self.len()
    }

    fn sparse_row(&self, row: usize) -> Result<SparseVector> {
        Ok(self[row].clone())
    }
}

/// Compressed sparse row matrix of `f32` values.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
    cols: usize,
}

impl CsrMatrix {
    /// Build from the usual CSR triplet. `indptr` has one entry per row plus
    /// one, is non-decreasing, and ends at `indices.len()`.
    pub fn from_parts(
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
        cols: usize,
    ) -> std::result::Result<Self, ShapeError> {
        let consistent = !indptr.is_empty()
            && indptr[0] == 0
            && indptr.windows(2).all(|w| w[0] <= w[1])
            && indptr.last() == Some(&indices.len())
            && indices.len() == data.len()
            && indices.iter().all(|&c| c < cols);
        if !consistent {
            return Err(ShapeError {
                rows: indptr.len().saturating_sub(1),
                cols,
                len: data.len(),
            });
        }
        Ok(Self {
            indptr,
            indices,
            data,
            cols,
        })
    }

    /// Compress a dense row-major buffer, dropping zeros.
    pub fn from_dense(
        shape: (usize, usize),
        values: &[f32],
    ) -> std::result::Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if values.len() != rows * cols {
            return Err(ShapeError {
                rows,
                cols,
                len: values.len(),
            });
        }
        let mut indptr = Vec::with_capacity(rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in values.chunks(cols.max(1)).take(rows) {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }
        // zero-column matrices still need one indptr entry per row
        while indptr.len() < rows + 1 {
            indptr.push(indices.len());
        }
        Ok(Self {
            indptr,
            indices,
            data,
            cols,
        })
    }

    pub fn nrows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.cols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }
}

impl RowSource for CsrMatrix {
    fn n_rows(&self) -> usize {
        self.nrows()
    }

    fn sparse_row(&self, row: usize) -> Result<SparseVector> {
        let span = self.indptr[row]..self.indptr[row + 1];
        let mut entries = Vec::with_capacity(span.len());
        for (&col, &value) in self.indices[span.clone()].iter().zip(&self.data[span]) {
            if value != 0.0 {
                entries.push((column_index(col)?, value));
            }
        }
        Ok(SparseVector::from_unsorted(entries))
    }
}

#[derive(Debug, Clone)]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    len: usize,
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid shape ({}, {}) for buffer of length {}",
            self.rows, self.cols, self.len
        )
    }
}

impl std::error::Error for ShapeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_rows_drop_zeros() {
        let x = Array2::from_shape_vec((2, 3), vec![1.0, 0.0, -2.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(x.n_rows(), 2);
        assert_eq!(x.sparse_row(0).unwrap().as_slice(), &[(0, 1.0), (2, -2.0)]);
        assert!(x.sparse_row(1).unwrap().is_empty());
        assert_eq!(x.view().sparse_row(0).unwrap(), x.sparse_row(0).unwrap());
    }

    #[test]
    fn test_csr_matches_dense() {
        let values = vec![0.0, 1.5, 0.0, 2.0, 0.0, 0.0, -1.0, 0.0, 3.0];
        let dense = Array2::from_shape_vec((3, 3), values.clone()).unwrap();
        let csr = CsrMatrix::from_dense((3, 3), &values).unwrap();
        assert_eq!(csr.shape(), (3, 3));
        assert_eq!(csr.nnz(), 4);
        for row in 0..3 {
            assert_eq!(csr.sparse_row(row).unwrap(), dense.sparse_row(row).unwrap());
        }
    }

    #[test]
    fn test_csr_from_parts_validates() {
        assert!(CsrMatrix::from_parts(vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0], 2).is_ok());
        // indptr does not cover all entries
        assert!(CsrMatrix::from_parts(vec![0, 1], vec![0, 1], vec![1.0, 2.0], 2).is_err());
        // column out of range
        assert!(CsrMatrix::from_parts(vec![0, 1], vec![5], vec![1.0], 2).is_err());
        assert!(CsrMatrix::from_dense((2, 2), &[1.0]).is_err());
    }
}
