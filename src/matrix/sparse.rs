// Sparse CSR operator over faer's owning row-major sparse storage

use std::cell::OnceCell;

use faer::Mat;
use faer::sparse::{SparseRowMat, SymbolicSparseRowMat, Triplet};

use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::matrix::dense::MatrixOperator;
use crate::vectorarray::DenseVectorArray;

/// Compressed sparse row matrix used as a linear operator.
///
/// `apply_inverse` falls back to a dense LU factorization of the assembled
/// matrix, computed once.
pub struct CsrMatrix {
    inner: SparseRowMat<usize, f64>,
    dense: OnceCell<MatrixOperator>,
}

impl CsrMatrix {
    /// Build from raw CSR arrays; column indices must be strictly increasing
    /// within each row.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, MorError> {
        if row_ptr.len() != nrows + 1 || row_ptr[0] != 0 || row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(MorError::Value("row_ptr must be non-decreasing with nrows + 1 entries".into()));
        }
        let nnz = row_ptr[nrows];
        if col_idx.len() != nnz || values.len() != nnz {
            return Err(MorError::DimensionMismatch(format!(
                "{nnz} nonzeros but {} column indices and {} values",
                col_idx.len(),
                values.len()
            )));
        }
        if let Some(&c) = col_idx.iter().find(|&&c| c >= ncols) {
            return Err(MorError::Index { index: c as isize, len: ncols });
        }
        if row_ptr.windows(2).any(|w| col_idx[w[0]..w[1]].windows(2).any(|c| c[0] >= c[1])) {
            return Err(MorError::Value("column indices must be strictly increasing within each row".into()));
        }
        let symbolic = SymbolicSparseRowMat::new_checked(nrows, ncols, row_ptr, None, col_idx);
        Ok(Self::from_faer(SparseRowMat::new(symbolic, values)))
    }

    /// Build from `(row, col, value)` triplets; duplicates are summed.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Result<Self, MorError> {
        let mut entries = Vec::with_capacity(triplets.len());
        for &(i, j, v) in triplets {
            if i >= nrows {
                return Err(MorError::Index { index: i as isize, len: nrows });
            }
            if j >= ncols {
                return Err(MorError::Index { index: j as isize, len: ncols });
            }
            entries.push(Triplet::new(i, j, v));
        }
        let inner = SparseRowMat::<usize, f64>::try_new_from_triplets(nrows, ncols, &entries)
            .map_err(|e| MorError::Value(format!("invalid sparse structure: {e:?}")))?;
        Ok(Self::from_faer(inner))
    }

    pub fn from_faer(inner: SparseRowMat<usize, f64>) -> Self {
        Self { inner, dense: OnceCell::new() }
    }

    pub fn nnz(&self) -> usize {
        self.inner.val().len()
    }

    /// y = A * x
    fn spmv(&self, x: &[f64], y: &mut [f64]) {
        let symbolic = self.inner.symbolic();
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = symbolic
                .col_idx_of_row_raw(i)
                .iter()
                .zip(self.inner.val_of_row(i))
                .map(|(&j, &a)| a * x[j])
                .sum();
        }
    }
}

impl Operator for CsrMatrix {
    fn dim_source(&self) -> usize {
        self.inner.ncols()
    }

    fn dim_range(&self) -> usize {
        self.inner.nrows()
    }

    fn apply(&self, u: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        if u.dim() != self.dim_source() {
            return Err(MorError::DimensionMismatch(format!(
                "sparse operator with {} columns applied to vectors of dimension {}",
                self.dim_source(),
                u.dim()
            )));
        }
        let rows = ind.resolve(u.len())?;
        let n = self.dim_range();
        let mut data = vec![0.0; n * rows.len()];
        for (k, r) in rows.into_iter().enumerate() {
            self.spmv(u.vector(r), &mut data[k * n..(k + 1) * n]);
        }
        DenseVectorArray::from_data(n, data)
    }

    fn apply_inverse(&self, v: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        self.dense
            .get_or_init(|| MatrixOperator::new(self.inner.to_dense()))
            .apply_inverse(v, ind)
    }

    fn assemble(&self) -> Result<Mat<f64>, MorError> {
        Ok(self.inner.to_dense())
    }
}
