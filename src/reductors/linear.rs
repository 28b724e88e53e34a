//! Reduction of affinely decomposed stationary linear problems with a
//! residual-based error estimator.
//!
//! For a reduced solution `u` the full-order residual is
//!
//! ```text
//! r(μ) = Σ_p θ^b_p(μ) b_p + Σ_k Σ_j θ^A_k(μ) u_j (-A_k v_j)
//! ```
//!
//! i.e. a linear combination of fixed vectors `R_q` with coefficients that
//! only depend on `μ` and `u`. The estimator stores the Gram matrix
//! `M_pq = (P⁻¹ R_p) · R_q` and evaluates the dual norm of the residual as
//! `sqrt(cᵀ M c)` without touching full-order vectors.
//!
//! Component layout: first all right-hand side terms, then one block of
//! `dim` entries per operator term. A non-parametric operator (or right-hand
//! side) contributes a single term with coefficient one.

use faer::Mat;
use tracing::{debug, info};

use crate::core::indices::Indices;
use crate::core::parameter::{Coefficient, Parameter, evaluate_coefficients};
use crate::core::traits::Operator;
use crate::discretizations::StationaryProblem;
use crate::error::MorError;
use crate::reductors::basic::{GenericReconstructor, ReductionData, reduce_generic_rb};
use crate::vectorarray::DenseVectorArray;

/// Residual vectors `R` and their Riesz representatives `RR`, kept for
/// incremental reuse when the basis grows.
#[derive(Debug, Clone)]
pub struct ResidualData {
    pub r_r: DenseVectorArray<f64>,
    pub rr_r: DenseVectorArray<f64>,
    /// One array per operator term, holding `-A_k v_j` for every basis vector.
    pub r_os: Vec<DenseVectorArray<f64>>,
    pub rr_os: Vec<DenseVectorArray<f64>>,
    /// Gram matrix of the representatives, in estimator component layout.
    pub gram: Mat<f64>,
}

impl ResidualData {
    fn basis_len(&self) -> usize {
        self.r_os.first().map_or(0, DenseVectorArray::len)
    }
}

/// Dual norm of the residual of a reduced solution.
#[derive(Debug, Clone)]
pub struct ResidualEstimator {
    matrix: Mat<f64>,
    /// `None` for a non-parametric right-hand side.
    rhs_coefficients: Option<Vec<Coefficient>>,
    /// `None` for a non-parametric operator.
    operator_coefficients: Option<Vec<Coefficient>>,
    dim: usize,
}

impl ResidualEstimator {
    pub fn new(
        matrix: Mat<f64>,
        rhs_coefficients: Option<Vec<Coefficient>>,
        operator_coefficients: Option<Vec<Coefficient>>,
        dim: usize,
    ) -> Result<Self, MorError> {
        let cr = rhs_coefficients.as_ref().map_or(1, Vec::len);
        let co = operator_coefficients.as_ref().map_or(1, Vec::len);
        let size = cr + co * dim;
        if matrix.nrows() != size || matrix.ncols() != size {
            return Err(MorError::DimensionMismatch(format!(
                "estimator matrix is {}x{}, expected {size}x{size}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Ok(Self { matrix, rhs_coefficients, operator_coefficients, dim })
    }

    pub fn matrix(&self) -> &Mat<f64> {
        &self.matrix
    }

    /// Reduced dimension the estimator was built for.
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn rhs_terms(&self) -> usize {
        self.rhs_coefficients.as_ref().map_or(1, Vec::len)
    }

    fn operator_terms(&self) -> usize {
        self.operator_coefficients.as_ref().map_or(1, Vec::len)
    }

    /// Estimated error of the single reduced solution `u` at `mu`.
    pub fn estimate(&self, u: &DenseVectorArray<f64>, mu: Option<&Parameter>) -> Result<f64, MorError> {
        if u.len() != 1 {
            return Err(MorError::Value(format!("can estimate one solution vector at a time, got {}", u.len())));
        }
        if u.dim() != self.dim {
            return Err(MorError::DimensionMismatch(format!(
                "reduced solution of dimension {} for an estimator of dimension {}",
                u.dim(),
                self.dim
            )));
        }
        let cr = match &self.rhs_coefficients {
            Some(c) => evaluate_coefficients(c, mu)?,
            None => vec![1.0],
        };
        let co = match &self.operator_coefficients {
            Some(c) => evaluate_coefficients(c, mu)?,
            None => vec![1.0],
        };

        let u = u.vector(0);
        let mut c = cr;
        c.reserve(co.len() * u.len());
        for theta in co {
            c.extend(u.iter().map(|&uj| theta * uj));
        }

        let mut quad = 0.0;
        for (p, &cp) in c.iter().enumerate() {
            if cp == 0.0 {
                continue;
            }
            let row: f64 = c.iter().enumerate().map(|(q, &cq)| self.matrix[(p, q)] * cq).sum();
            quad += cp * row;
        }
        Ok(quad.max(0.0).sqrt())
    }

    /// Estimator for the reduced problem on the first `dim` basis vectors.
    pub fn restricted_to_subbasis(&self, dim: usize) -> Result<Self, MorError> {
        if dim > self.dim {
            return Err(MorError::Value(format!("cannot restrict estimator of dimension {} to {dim}", self.dim)));
        }
        let cr = self.rhs_terms();
        let mut indices: Vec<usize> = (0..cr).collect();
        for k in 0..self.operator_terms() {
            indices.extend((0..dim).map(|j| cr + k * self.dim + j));
        }
        let n = indices.len();
        let matrix = Mat::from_fn(n, n, |i, j| self.matrix[(indices[i], indices[j])]);
        Self::new(matrix, self.rhs_coefficients.clone(), self.operator_coefficients.clone(), dim)
    }
}

fn riesz_representative(
    u: &DenseVectorArray<f64>,
    error_product: Option<&dyn Operator>,
) -> Result<DenseVectorArray<f64>, MorError> {
    match error_product {
        None => Ok(u.clone()),
        Some(p) => p.apply_inverse(u, &Indices::All),
    }
}

/// Append `vectors` to `r` and their representatives to `rr`.
fn append_vectors(
    mut vectors: DenseVectorArray<f64>,
    r: &mut DenseVectorArray<f64>,
    rr: &mut DenseVectorArray<f64>,
    error_product: Option<&dyn Operator>,
) -> Result<(), MorError> {
    let mut representatives = riesz_representative(&vectors, error_product)?;
    rr.append_take(&mut representatives, &Indices::All)?;
    r.append_take(&mut vectors, &Indices::All)
}

/// One block of estimator components: the representatives, the residual
/// vectors and how many of them the previous Gram matrix already covers.
struct Block<'a> {
    rr: &'a DenseVectorArray<f64>,
    r: &'a DenseVectorArray<f64>,
    old_len: usize,
    old_offset: usize,
    offset: usize,
}

/// Gram matrix over all blocks, copying the entries `old` already holds and
/// computing only rows and columns of vectors added since.
fn assemble_gram(blocks: &[Block<'_>], old: Option<&Mat<f64>>) -> Result<Mat<f64>, MorError> {
    let size: usize = blocks.iter().map(|b| b.r.len()).sum();
    let mut gram = Mat::<f64>::zeros(size, size);
    let mut computed = 0usize;

    for bp in blocks {
        for bq in blocks {
            if let Some(old) = old {
                for i in 0..bp.old_len {
                    for j in 0..bq.old_len {
                        gram[(bp.offset + i, bq.offset + j)] = old[(bp.old_offset + i, bq.old_offset + j)];
                    }
                }
            }

            let (len_p, len_q) = (bp.r.len(), bq.r.len());
            if bp.old_len < len_p && len_q > 0 {
                // new rows against every column
                let g = bp.rr.dot(bq.r, &Indices::range(bp.old_len, len_p), &Indices::All)?;
                for i in 0..g.nrows() {
                    for j in 0..g.ncols() {
                        gram[(bp.offset + bp.old_len + i, bq.offset + j)] = g[(i, j)];
                    }
                }
                computed += g.nrows() * g.ncols();
            }
            if bp.old_len > 0 && bq.old_len < len_q {
                // old rows against new columns
                let g = bp.rr.dot(bq.r, &Indices::range(0, bp.old_len), &Indices::range(bq.old_len, len_q))?;
                for i in 0..g.nrows() {
                    for j in 0..g.ncols() {
                        gram[(bp.offset + i, bq.offset + bq.old_len + j)] = g[(i, j)];
                    }
                }
                computed += g.nrows() * g.ncols();
            }
        }
    }
    debug!("estimator matrix {}x{}: {} new entries", size, size, computed);
    Ok(gram)
}

/// Galerkin reduction of `problem` onto `rb` together with a residual error
/// estimator in the norm dual to `error_product` (Euclidean if `None`).
///
/// `extends` is the [`ReductionData`] of a previous reduction whose basis is
/// a prefix of `rb`; its residual vectors and Gram matrix are reused and only
/// the contributions of the new basis vectors are computed.
pub fn reduce_stationary_affine_linear(
    problem: &StationaryProblem,
    rb: Option<&DenseVectorArray<f64>>,
    error_product: Option<&dyn Operator>,
    extends: Option<ReductionData>,
) -> Result<(StationaryProblem, GenericReconstructor, ReductionData), MorError> {
    let (rd, rc, mut data) = reduce_generic_rb(problem, rb, None)?;
    let rb = &data.v;
    let n = problem.dim_solution();

    let rhs_parametric = problem.rhs.parametric();
    let op_parametric = problem.operator.parametric();
    let co = if op_parametric { problem.operator.num_terms() } else { 1 };

    let old = match extends {
        Some(ReductionData { v: old_v, residual: Some(residual), .. }) => {
            let prefix = old_v.len();
            let is_prefix = prefix <= rb.len()
                && old_v.dim() == rb.dim()
                && rb
                    .almost_equal_default(&old_v, &Indices::range(0, prefix), &Indices::All)?
                    .into_iter()
                    .all(|eq| eq);
            if !is_prefix {
                return Err(MorError::Value("extended reduction needs the old basis as a prefix".into()));
            }
            if residual.r_os.len() != co || residual.basis_len() != prefix {
                return Err(MorError::Value("reduction data belongs to a different problem".into()));
            }
            Some(residual)
        }
        _ => None,
    };
    let old_rb_len = old.as_ref().map_or(0, ResidualData::basis_len);

    let (r_r, rr_r, mut r_os, mut rr_os, old_gram) = match old {
        Some(ResidualData { r_r, rr_r, r_os, rr_os, gram }) => (r_r, rr_r, r_os, rr_os, Some(gram)),
        None => {
            let mut r_r = DenseVectorArray::empty(n, problem.rhs.num_terms());
            let mut rr_r = DenseVectorArray::empty(n, problem.rhs.num_terms());
            if rhs_parametric {
                for term in &problem.rhs.operators {
                    append_vectors(term.as_vector()?, &mut r_r, &mut rr_r, error_product)?;
                }
            } else {
                append_vectors(problem.rhs.as_vector(None)?, &mut r_r, &mut rr_r, error_product)?;
            }
            let r_os = vec![DenseVectorArray::empty(n, rb.len()); co];
            let rr_os = vec![DenseVectorArray::empty(n, rb.len()); co];
            (r_r, rr_r, r_os, rr_os, None)
        }
    };
    let old_rhs_len = if old_gram.is_some() { r_r.len() } else { 0 };

    let new_ind = Indices::range(old_rb_len, rb.len());
    for k in 0..co {
        let mut images = if op_parametric {
            problem.operator.operators[k].apply(rb, &new_ind)?
        } else {
            problem.operator.apply(rb, &new_ind, None)?
        };
        images.scal(-1.0, &Indices::All)?;
        append_vectors(images, &mut r_os[k], &mut rr_os[k], error_product)?;
    }

    let cr = r_r.len();
    let mut blocks = vec![Block { rr: &rr_r, r: &r_r, old_len: old_rhs_len, old_offset: 0, offset: 0 }];
    for k in 0..co {
        blocks.push(Block {
            rr: &rr_os[k],
            r: &r_os[k],
            old_len: old_rb_len,
            old_offset: cr + k * old_rb_len,
            offset: cr + k * rb.len(),
        });
    }
    let gram = assemble_gram(&blocks, old_gram.as_ref())?;
    drop(blocks);

    let estimator = ResidualEstimator::new(
        gram.clone(),
        rhs_parametric.then(|| problem.rhs.coefficients.clone()),
        op_parametric.then(|| problem.operator.coefficients.clone()),
        rb.len(),
    )?;
    info!(
        "reduced to order {} (estimator with {} components, {} basis vectors reused)",
        rb.len(),
        gram.nrows(),
        old_rb_len
    );

    data.residual = Some(ResidualData { r_r, rr_r, r_os, rr_os, gram });
    Ok((rd.with_estimator(estimator), rc, data))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::parameter::ProjectionParameterFunctional;
    use crate::matrix::MatrixOperator;
    use crate::operators::LincombOperator;

    fn diag(values: &[f64]) -> Arc<dyn Operator> {
        let n = values.len();
        Arc::new(MatrixOperator::new(Mat::from_fn(n, n, |i, j| if i == j { values[i] } else { 0.0 })))
    }

    fn problem() -> StationaryProblem {
        let operator = LincombOperator::new(
            vec![diag(&[2.0, 2.0, 2.0, 2.0]), diag(&[1.0, 0.0, 3.0, 1.0])],
            vec![Coefficient::Constant(1.0), Coefficient::parametric(ProjectionParameterFunctional::new(0))],
        )
        .unwrap();
        let rhs = LincombOperator::new(
            vec![
                Arc::new(MatrixOperator::from_vector(&[1.0, 1.0, 0.0, 1.0])) as Arc<dyn Operator>,
                Arc::new(MatrixOperator::from_vector(&[0.0, 1.0, 2.0, 0.0])),
            ],
            vec![Coefficient::Constant(1.0), Coefficient::parametric(|mu: &Parameter| mu.values()[0].sin())],
        )
        .unwrap();
        StationaryProblem::new(operator, rhs).unwrap()
    }

    #[test]
    fn estimate_equals_residual_norm() {
        let p = problem();
        let rb = DenseVectorArray::from_rows(&[[1.0, 0.0, 0.0, 0.0], [0.0, 0.6, 0.8, 0.0]]).unwrap();
        let (rd, rc, _) = reduce_stationary_affine_linear(&p, Some(&rb), None, None).unwrap();
        for mu in [0.1, 1.0, 2.5] {
            let mu = Parameter::from(mu);
            let u = rd.solve(Some(&mu)).unwrap();
            let residual = p.residual(&rc.reconstruct(&u).unwrap(), Some(&mu)).unwrap();
            let direct = residual.l2_norm(&Indices::All).unwrap()[0];
            assert_abs_diff_eq!(rd.estimate(&u, Some(&mu)).unwrap(), direct, epsilon = 1e-10);
        }
    }

    #[test]
    fn restriction_drops_components() {
        let p = problem();
        let rb = DenseVectorArray::identity(4);
        let (rd, _, _) = reduce_stationary_affine_linear(&p, Some(&rb), None, None).unwrap();
        let est = rd.estimator.as_ref().unwrap();
        assert_eq!(est.matrix().nrows(), 2 + 2 * 4);
        let sub = est.restricted_to_subbasis(1).unwrap();
        assert_eq!(sub.matrix().nrows(), 2 + 2);
        assert_eq!(sub.matrix()[(2, 3)], est.matrix()[(2, 6)]);
        assert!(est.restricted_to_subbasis(5).is_err());
    }

    #[test]
    fn estimate_rejects_several_vectors() {
        let p = problem();
        let (rd, _, _) = reduce_stationary_affine_linear(&p, Some(&DenseVectorArray::identity(4)), None, None).unwrap();
        let u = DenseVectorArray::<f64>::zeros(4, 2);
        assert!(matches!(rd.estimate(&u, Some(&Parameter::from(1.0))), Err(MorError::Value(_))));
    }

    #[test]
    fn extension_requires_prefix() {
        let p = problem();
        let rb = DenseVectorArray::from_rows(&[[1.0, 0.0, 0.0, 0.0]]).unwrap();
        let (_, _, data) = reduce_stationary_affine_linear(&p, Some(&rb), None, None).unwrap();
        let other = DenseVectorArray::from_rows(&[[0.0, 1.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]).unwrap();
        let err = reduce_stationary_affine_linear(&p, Some(&other), None, Some(data)).unwrap_err();
        assert!(matches!(err, MorError::Value(_)));
    }
}
