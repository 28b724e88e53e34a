//! Core operator traits for morkit.

use faer::Mat;

use crate::core::indices::Indices;
use crate::discretizations::lti::{GramianFactors, GramianType, LtiSystem};
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// Linear map between two vector-array spaces.
///
/// Only `dim_source`, `dim_range` and `apply` are required; the remaining
/// methods have defaults expressed through `apply`.
pub trait Operator {
    /// Dimension of the vectors the operator acts on.
    fn dim_source(&self) -> usize;

    /// Dimension of the resulting vectors.
    fn dim_range(&self) -> usize;

    /// Apply the operator to the selected vectors of `u`.
    fn apply(&self, u: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError>;

    /// Bilinear form `vᵀ A u` as a dense matrix (rows: `v`, columns: `u`).
    fn apply2(
        &self,
        v: &DenseVectorArray<f64>,
        u: &DenseVectorArray<f64>,
        v_ind: &Indices,
        u_ind: &Indices,
    ) -> Result<Mat<f64>, MorError> {
        let au = self.apply(u, u_ind)?;
        v.dot(&au, v_ind, &Indices::All)
    }

    /// Pairwise bilinear form `v_i ᵀ A u_i`.
    fn pairwise_apply2(
        &self,
        v: &DenseVectorArray<f64>,
        u: &DenseVectorArray<f64>,
        v_ind: &Indices,
        u_ind: &Indices,
    ) -> Result<Vec<f64>, MorError> {
        let au = self.apply(u, u_ind)?;
        v.pairwise_dot(&au, v_ind, &Indices::All)
    }

    /// Solve `A x = v` for each selected vector of `v`.
    fn apply_inverse(&self, v: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        let _ = (v, ind);
        Err(MorError::Unsupported("apply_inverse"))
    }

    /// The single vector represented by an operator with one-dimensional source.
    fn as_vector(&self) -> Result<DenseVectorArray<f64>, MorError> {
        if self.dim_source() != 1 {
            return Err(MorError::DimensionMismatch(format!(
                "as_vector needs dim_source == 1, got {}",
                self.dim_source()
            )));
        }
        self.apply(&DenseVectorArray::from_data(1, vec![1.0])?, &Indices::All)
    }

    /// Dense matrix of the operator, assembled column by column.
    fn assemble(&self) -> Result<Mat<f64>, MorError> {
        let columns = self.apply(&DenseVectorArray::identity(self.dim_source()), &Indices::All)?;
        Ok(columns.to_columns())
    }
}

/// Solver for the matrix equations behind LTI Gramians.
///
/// Balanced truncation only consumes the low-rank factors; computing them is
/// left to implementations of this trait.
pub trait MatrixEquationSolver {
    fn gramian_factors(&self, sys: &LtiSystem, typ: GramianType) -> Result<GramianFactors, MorError>;
}
