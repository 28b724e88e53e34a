//! Galerkin and Petrov-Galerkin projection of stationary problems.

use std::sync::Arc;

use faer::Mat;
use tracing::debug;

use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::discretizations::StationaryProblem;
use crate::error::MorError;
use crate::matrix::MatrixOperator;
use crate::operators::LincombOperator;
use crate::reductors::linear::ResidualData;
use crate::vectorarray::DenseVectorArray;

/// Data kept from a reduction so that a later reduction with an extended
/// basis can reuse it.
#[derive(Debug, Clone)]
pub struct ReductionData {
    /// Trial basis.
    pub v: DenseVectorArray<f64>,
    /// Test basis.
    pub w: DenseVectorArray<f64>,
    /// Residual vectors and their Gram matrix, if an estimator was built.
    pub residual: Option<ResidualData>,
}

/// Maps reduced coefficient vectors back to the full space.
#[derive(Debug, Clone)]
pub struct GenericReconstructor {
    pub basis: DenseVectorArray<f64>,
}

impl GenericReconstructor {
    pub fn new(basis: DenseVectorArray<f64>) -> Self {
        Self { basis }
    }

    /// `Σ_j u_j v_j` for every coefficient vector `u`.
    pub fn reconstruct(&self, u: &DenseVectorArray<f64>) -> Result<DenseVectorArray<f64>, MorError> {
        if u.dim() != self.basis.len() {
            return Err(MorError::DimensionMismatch(format!(
                "{}-dimensional coefficients for a basis of length {}",
                u.dim(),
                self.basis.len()
            )));
        }
        self.basis.lincomb(u.to_rows().as_ref(), &Indices::All)
    }

    /// Reconstructor for the first `dim` basis vectors.
    pub fn restricted_to_subbasis(&self, dim: usize) -> Result<Self, MorError> {
        if dim > self.basis.len() {
            return Err(MorError::Value(format!(
                "cannot restrict a basis of length {} to {dim} vectors",
                self.basis.len()
            )));
        }
        Ok(Self::new(self.basis.copy(&Indices::range(0, dim))?))
    }
}

/// Matrix of `op` between the given bases.
///
/// With a source basis `V` the operator is applied to `V`, otherwise it is
/// assembled. With a range basis `W` the result is tested against `W`
/// (`Wᵀ A V`), otherwise the images are returned as columns (`A V`).
pub fn project(
    op: &dyn Operator,
    range_basis: Option<&DenseVectorArray<f64>>,
    source_basis: Option<&DenseVectorArray<f64>>,
) -> Result<MatrixOperator, MorError> {
    let image = match source_basis {
        Some(v) => op.apply(v, &Indices::All)?,
        None => DenseVectorArray::from_columns(op.assemble()?.as_ref()),
    };
    let matrix = match range_basis {
        Some(w) => w.dot(&image, &Indices::All, &Indices::All)?,
        None => image.to_columns(),
    };
    Ok(MatrixOperator::new(matrix))
}

/// Project every term of `op`; the coefficients are kept.
pub fn project_lincomb(
    op: &LincombOperator,
    range_basis: Option<&DenseVectorArray<f64>>,
    source_basis: Option<&DenseVectorArray<f64>>,
) -> Result<LincombOperator, MorError> {
    let operators = op
        .operators
        .iter()
        .map(|term| Ok(Arc::new(project(term.as_ref(), range_basis, source_basis)?) as Arc<dyn Operator>))
        .collect::<Result<Vec<_>, MorError>>()?;
    LincombOperator::new(operators, op.coefficients.clone())
}

/// Petrov-Galerkin projection onto trial space `v` and test space `w`.
pub fn reduce_generic_pg(
    problem: &StationaryProblem,
    v: &DenseVectorArray<f64>,
    w: &DenseVectorArray<f64>,
) -> Result<(StationaryProblem, GenericReconstructor, ReductionData), MorError> {
    if v.len() != w.len() {
        return Err(MorError::DimensionMismatch(format!(
            "trial basis of length {} but test basis of length {}",
            v.len(),
            w.len()
        )));
    }
    let operator = project_lincomb(&problem.operator, Some(w), Some(v))?;
    let rhs = project_lincomb(&problem.rhs, Some(w), None)?;
    debug!("projected problem of order {} onto {} vectors", problem.dim_solution(), v.len());

    let reduced = StationaryProblem::new(operator, rhs)?;
    let data = ReductionData { v: v.clone(), w: w.clone(), residual: None };
    Ok((reduced, GenericReconstructor::new(v.clone()), data))
}

/// Galerkin projection onto the reduced basis `rb` (empty if `None`).
///
/// With `product` the test space is `P rb`, so the reduced operator is
/// `rbᵀ Pᵀ A rb`.
pub fn reduce_generic_rb(
    problem: &StationaryProblem,
    rb: Option<&DenseVectorArray<f64>>,
    product: Option<&dyn Operator>,
) -> Result<(StationaryProblem, GenericReconstructor, ReductionData), MorError> {
    let empty;
    let rb = match rb {
        Some(rb) => rb,
        None => {
            empty = DenseVectorArray::empty(problem.dim_solution(), 0);
            &empty
        }
    };
    match product {
        None => reduce_generic_pg(problem, rb, rb),
        Some(p) => reduce_generic_pg(problem, rb, &p.apply(rb, &Indices::All)?),
    }
}

fn leading_block(op: &dyn Operator, rows: usize, cols: usize) -> Result<Arc<dyn Operator>, MorError> {
    let m = op.assemble()?;
    if rows > m.nrows() || cols > m.ncols() {
        return Err(MorError::DimensionMismatch(format!(
            "cannot take a {rows}x{cols} block of a {}x{} matrix",
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(Arc::new(MatrixOperator::new(Mat::from_fn(rows, cols, |i, j| m[(i, j)]))))
}

/// Restrict a reduced problem to its first `dim` basis vectors.
///
/// Only valid for bases built hierarchically, where the reduced problem for
/// a prefix of the basis is a leading block of the full reduced problem.
pub fn reduce_to_subbasis(
    rd: &StationaryProblem,
    rc: &GenericReconstructor,
    dim: usize,
) -> Result<(StationaryProblem, GenericReconstructor), MorError> {
    if dim > rd.dim_solution() {
        return Err(MorError::Value(format!(
            "cannot restrict a reduced problem of order {} to order {dim}",
            rd.dim_solution()
        )));
    }
    let terms = |op: &LincombOperator, rows: usize, cols: usize| -> Result<LincombOperator, MorError> {
        let operators = op
            .operators
            .iter()
            .map(|t| leading_block(t.as_ref(), rows, cols))
            .collect::<Result<Vec<_>, _>>()?;
        LincombOperator::new(operators, op.coefficients.clone())
    };
    let mut reduced = StationaryProblem::new(terms(&rd.operator, dim, dim)?, terms(&rd.rhs, dim, 1)?)?;
    if let Some(est) = &rd.estimator {
        reduced = reduced.with_estimator(est.restricted_to_subbasis(dim)?);
    }
    Ok((reduced, rc.restricted_to_subbasis(dim)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn problem() -> StationaryProblem {
        let a = MatrixOperator::new(Mat::from_fn(3, 3, |i, j| match i.abs_diff(j) {
            0 => 2.0,
            1 => -1.0,
            _ => 0.0,
        }));
        StationaryProblem::new(
            LincombOperator::single(Arc::new(a)),
            LincombOperator::single(Arc::new(MatrixOperator::from_vector(&[1.0, 0.0, 1.0]))),
        )
        .unwrap()
    }

    #[test]
    fn projection_between_bases() {
        let a = MatrixOperator::new(Mat::from_fn(2, 2, |i, j| (i * 2 + j) as f64));
        let v = DenseVectorArray::from_rows(&[[1.0, 1.0]]).unwrap();
        let w = DenseVectorArray::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
        // A = [[0,1],[2,3]], A v = [1, 5]
        let pg = project(&a, Some(&w), Some(&v)).unwrap();
        assert_eq!((pg.dim_range(), pg.dim_source()), (2, 1));
        assert_eq!(pg.matrix()[(1, 0)], 5.0);
        let columns = project(&a, None, Some(&v)).unwrap();
        assert_eq!(columns.matrix()[(0, 0)], 1.0);
        let tested = project(&a, Some(&v), None).unwrap();
        assert_eq!((tested.matrix()[(0, 0)], tested.matrix()[(0, 1)]), (2.0, 4.0));
    }

    #[test]
    fn full_basis_reproduces_solution() {
        let p = problem();
        let rb = DenseVectorArray::identity(3);
        let (rd, rc, data) = reduce_generic_rb(&p, Some(&rb), None).unwrap();
        assert_eq!(data.v.len(), 3);
        let u = rc.reconstruct(&rd.solve(None).unwrap()).unwrap();
        let exact = p.solve(None).unwrap();
        for (a, b) in u.as_slice().iter().zip(exact.as_slice()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_basis_reduces_to_order_zero() {
        let (rd, rc, _) = reduce_generic_rb(&problem(), None, None).unwrap();
        assert_eq!(rd.dim_solution(), 0);
        let u = rc.reconstruct(&rd.solve(None).unwrap()).unwrap();
        assert_eq!(u.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn subbasis_matches_fresh_reduction() {
        let p = problem();
        let rb = DenseVectorArray::from_rows(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).unwrap();
        let (rd, rc, _) = reduce_generic_rb(&p, Some(&rb), None).unwrap();
        let (sub, sub_rc) = reduce_to_subbasis(&rd, &rc, 2).unwrap();
        let (fresh, _, _) = reduce_generic_rb(&p, Some(&rb.copy(&Indices::range(0, 2)).unwrap()), None).unwrap();
        assert_eq!(sub.operator.assemble(None).unwrap().matrix(), fresh.operator.assemble(None).unwrap().matrix());
        assert_eq!(sub_rc.basis.len(), 2);
        assert!(reduce_to_subbasis(&rd, &rc, 4).is_err());
    }
}
