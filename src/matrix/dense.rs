//! Dense matrix operator on top of Faer.
//!
//! `MatrixOperator` wraps a `faer::Mat<f64>` and implements [`Operator`]. The
//! partial-pivot LU factorization used by `apply_inverse` is computed on first use
//! and cached, so repeated Riesz-representative solves against the same inner
//! product matrix factor it only once.

use std::cell::OnceCell;
use std::fmt;

use faer::linalg::solvers::{PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatRef};

use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// Linear operator given by a dense matrix.
pub struct MatrixOperator {
    matrix: Mat<f64>,
    /// Cached LU factorization (if computed)
    factor: OnceCell<PartialPivLu<f64>>,
}

impl MatrixOperator {
    pub fn new(matrix: Mat<f64>) -> Self {
        Self { matrix, factor: OnceCell::new() }
    }

    /// Operator with one-dimensional source representing the vector `v`.
    pub fn from_vector(v: &[f64]) -> Self {
        Self::new(Mat::from_fn(v.len(), 1, |i, _| v[i]))
    }

    /// Operator with one-dimensional range representing the functional `v·`.
    pub fn functional(v: &[f64]) -> Self {
        Self::new(Mat::from_fn(1, v.len(), |_, j| v[j]))
    }

    pub fn identity(n: usize) -> Self {
        Self::new(Mat::identity(n, n))
    }

    pub fn matrix(&self) -> MatRef<'_, f64> {
        self.matrix.as_ref()
    }

    fn lu(&self) -> Result<&PartialPivLu<f64>, MorError> {
        if self.matrix.nrows() != self.matrix.ncols() {
            return Err(MorError::FactorError(format!(
                "cannot invert non-square {}x{} matrix",
                self.matrix.nrows(),
                self.matrix.ncols()
            )));
        }
        Ok(self.factor.get_or_init(|| PartialPivLu::new(self.matrix.as_ref())))
    }
}

impl Clone for MatrixOperator {
    fn clone(&self) -> Self {
        Self::new(self.matrix.clone())
    }
}

impl fmt::Debug for MatrixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixOperator")
            .field("nrows", &self.matrix.nrows())
            .field("ncols", &self.matrix.ncols())
            .field("factored", &self.factor.get().is_some())
            .finish()
    }
}

impl Operator for MatrixOperator {
    fn dim_source(&self) -> usize {
        self.matrix.ncols()
    }

    fn dim_range(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, u: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        if u.dim() != self.dim_source() {
            return Err(MorError::DimensionMismatch(format!(
                "operator with source dimension {} applied to vectors of dimension {}",
                self.dim_source(),
                u.dim()
            )));
        }
        let rows = ind.resolve(u.len())?;
        let (m, n) = (self.matrix.nrows(), self.matrix.ncols());
        let mut data = Vec::with_capacity(m * rows.len());
        for r in rows {
            let x = u.vector(r);
            for i in 0..m {
                let mut yi = 0.0;
                for j in 0..n {
                    yi += self.matrix[(i, j)] * x[j];
                }
                data.push(yi);
            }
        }
        DenseVectorArray::from_data(m, data)
    }

    fn apply_inverse(&self, v: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        if v.dim() != self.dim_range() {
            return Err(MorError::DimensionMismatch(format!(
                "inverse of operator with range dimension {} applied to vectors of dimension {}",
                self.dim_range(),
                v.dim()
            )));
        }
        let lu = self.lu()?;
        let mut rhs = v.copy(ind)?.to_columns();
        lu.solve_in_place_with_conj(Conj::No, rhs.as_mut());
        let x = DenseVectorArray::from_columns(rhs.as_ref());
        if x.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(MorError::FactorError("singular matrix in apply_inverse".into()));
        }
        Ok(x)
    }

    fn assemble(&self) -> Result<Mat<f64>, MorError> {
        Ok(self.matrix.clone())
    }
}
