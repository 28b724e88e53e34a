//! Operators built from other objects.

use faer::Mat;

use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// A vector array viewed as a linear map.
///
/// Not transposed, the array's vectors are the columns: coefficients in
/// `R^len` map to `Σ_j u_j a_j`. Transposed, a vector `v` maps to the inner
/// products `(a_j · v)_j`.
#[derive(Debug, Clone)]
pub struct VectorArrayOperator {
    array: DenseVectorArray<f64>,
    transposed: bool,
}

impl VectorArrayOperator {
    pub fn new(array: DenseVectorArray<f64>) -> Self {
        Self { array, transposed: false }
    }

    pub fn transposed(array: DenseVectorArray<f64>) -> Self {
        Self { array, transposed: true }
    }

    pub fn array(&self) -> &DenseVectorArray<f64> {
        &self.array
    }
}

impl Operator for VectorArrayOperator {
    fn dim_source(&self) -> usize {
        if self.transposed { self.array.dim() } else { self.array.len() }
    }

    fn dim_range(&self) -> usize {
        if self.transposed { self.array.len() } else { self.array.dim() }
    }

    fn apply(&self, u: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        if u.dim() != self.dim_source() {
            return Err(MorError::DimensionMismatch(format!(
                "operator with source dimension {} applied to vectors of dimension {}",
                self.dim_source(),
                u.dim()
            )));
        }
        if self.transposed {
            // rows: selected u, columns: array vectors
            let g = u.dot(&self.array, ind, &Indices::All)?;
            Ok(DenseVectorArray::from_columns(g.transpose()))
        } else {
            let coefficients = u.copy(ind)?.to_rows();
            self.array.lincomb(coefficients.as_ref(), &Indices::All)
        }
    }

    fn assemble(&self) -> Result<Mat<f64>, MorError> {
        Ok(if self.transposed { self.array.to_rows() } else { self.array.to_columns() })
    }
}

/// Identity on R^dim.
#[derive(Debug, Clone, Copy)]
pub struct IdentityOperator {
    pub dim: usize,
}

impl IdentityOperator {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Operator for IdentityOperator {
    fn dim_source(&self) -> usize {
        self.dim
    }

    fn dim_range(&self) -> usize {
        self.dim
    }

    fn apply(&self, u: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        if u.dim() != self.dim {
            return Err(MorError::DimensionMismatch(format!(
                "identity on dimension {} applied to vectors of dimension {}",
                self.dim,
                u.dim()
            )));
        }
        u.copy(ind)
    }

    fn apply_inverse(&self, v: &DenseVectorArray<f64>, ind: &Indices) -> Result<DenseVectorArray<f64>, MorError> {
        self.apply(v, ind)
    }

    fn assemble(&self) -> Result<Mat<f64>, MorError> {
        Ok(Mat::identity(self.dim, self.dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_operator_and_transpose() {
        let a = DenseVectorArray::from_rows(&[[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]]).unwrap();
        let op = VectorArrayOperator::new(a.clone());
        let coeffs = DenseVectorArray::from_rows(&[[2.0, -1.0]]).unwrap();
        let v = op.apply(&coeffs, &Indices::All).unwrap();
        assert_eq!(v.vector(0), &[2.0, -1.0, 3.0]);

        let op_t = VectorArrayOperator::transposed(a);
        let w = op_t.apply(&v, &Indices::All).unwrap();
        assert_eq!(w.dim(), 2);
        assert_eq!(w.vector(0), &[8.0, 2.0]);
    }

    #[test]
    fn identity_copies_and_inverts_to_itself() {
        let id = IdentityOperator::new(2);
        let u = DenseVectorArray::from_rows(&[[1.0, -2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(id.apply(&u, &Indices::One(1)).unwrap().vector(0), &[3.0, 4.0]);
        assert_eq!(id.apply_inverse(&u, &Indices::All).unwrap(), u);
        assert_eq!(id.apply2(&u, &u, &Indices::All, &Indices::All).unwrap(), u.gramian(&Indices::All).unwrap());
        assert_eq!(id.assemble().unwrap(), Mat::<f64>::identity(2, 2));

        let wrong = DenseVectorArray::from_rows(&[[1.0, 2.0, 3.0]]).unwrap();
        assert!(matches!(id.apply(&wrong, &Indices::All), Err(MorError::DimensionMismatch(_))));
    }

    #[test]
    fn array_operator_assembles_columns() {
        let a = DenseVectorArray::from_rows(&[[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]]).unwrap();
        let m = VectorArrayOperator::new(a.clone()).assemble().unwrap();
        assert_eq!((m.nrows(), m.ncols()), (3, 2));
        assert_eq!(m[(2, 0)], 2.0);
        let mt = VectorArrayOperator::transposed(a).assemble().unwrap();
        assert_eq!((mt.nrows(), mt.ncols()), (2, 3));
        assert_eq!(mt[(1, 2)], 1.0);
    }
}
