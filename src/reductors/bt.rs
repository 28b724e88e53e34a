//! Balanced truncation of LTI systems.
//!
//! The Hankel-type singular values are those of `ofᵀ E cf`, where `cf` and
//! `of` are low-rank factors of the two Gramians. Projection bases are built
//! from the leading singular vectors, either rescaled so that `Wᵀ E V = I`
//! (square root method) or orthonormalized (balancing-free square root).
//!
//! # References
//! - A. C. Antoulas (2005). Approximation of Large-Scale Dynamical Systems.
//! - D. Mustafa, K. Glover (1991). Controller reduction by H∞-balanced truncation.
//! - P. C. Opdenacker, E. A. Jonckheere (1988). A contraction mapping
//!   preserving balanced reduction scheme and its infinity norm error bounds.

use faer::Mat;
use tracing::{debug, info, warn};

use crate::algorithms::gram_schmidt::gram_schmidt_copy;
use crate::config::GramSchmidtOptions;
use crate::core::indices::Indices;
use crate::core::traits::{MatrixEquationSolver, Operator};
use crate::discretizations::{GramianFactors, GramianType, LtiSystem};
use crate::error::MorError;
use crate::operators::{IdentityOperator, VectorArrayOperator};
use crate::reductors::basic::{GenericReconstructor, project};
use crate::vectorarray::DenseVectorArray;

/// Projection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BtMethod {
    /// Square root: bases scaled by `1/sqrt(σ)`, reduced `E` is the identity.
    Sr,
    /// Balancing-free square root: orthonormalized bases.
    #[default]
    Bfsr,
}

/// Reduction order and method; at least one of `r` and `tol` must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct BtOptions {
    /// Order of the reduced model, or maximal order if `tol` is given.
    pub r: Option<usize>,
    /// Smallest order whose error bound is below `tol`.
    pub tol: Option<f64>,
    pub typ: GramianType,
    pub method: BtMethod,
}

impl Default for BtOptions {
    fn default() -> Self {
        Self { r: None, tol: None, typ: GramianType::Lyap, method: BtMethod::Bfsr }
    }
}

impl BtOptions {
    pub fn with_order(r: usize) -> Self {
        Self { r: Some(r), ..Self::default() }
    }

    pub fn with_tolerance(tol: f64) -> Self {
        Self { tol: Some(tol), ..Self::default() }
    }

    pub fn method(mut self, method: BtMethod) -> Self {
        self.method = method;
        self
    }

    pub fn typ(mut self, typ: GramianType) -> Self {
        self.typ = typ;
        self
    }
}

/// Bases and singular values of a balanced truncation.
#[derive(Debug, Clone)]
pub struct BtData {
    pub v: DenseVectorArray<f64>,
    pub w: DenseVectorArray<f64>,
    /// All singular values of `ofᵀ E cf`, descending.
    pub sv: Vec<f64>,
    /// `error_bounds[i]` bounds the error of the reduced model of order `i + 1`.
    pub error_bounds: Vec<f64>,
}

/// Singular values and singular vectors of `ofᵀ E cf`.
struct HankelSvd {
    sv: Vec<f64>,
    u: Mat<f64>,
    v: Mat<f64>,
    rank: usize,
}

fn hankel_svd(sys: &LtiSystem, cf: &DenseVectorArray<f64>, of: &DenseVectorArray<f64>) -> Result<HankelSvd, MorError> {
    let ecf = match &sys.e {
        Some(e) => e.apply(cf, &Indices::All)?,
        None => cf.clone(),
    };
    let product = of.dot(&ecf, &Indices::All, &Indices::All)?;
    let svd = product
        .as_ref()
        .thin_svd()
        .map_err(|e| MorError::EigenError(format!("{e:?}")))?;
    let s = svd.S().column_vector();
    let sv: Vec<f64> = (0..s.nrows()).map(|i| s[i]).collect();

    let threshold = sv.first().copied().unwrap_or(0.0) * f64::EPSILON * product.nrows().max(product.ncols()) as f64;
    let rank = sv.iter().take_while(|&&s| s > threshold).count();
    Ok(HankelSvd { sv, u: svd.U().to_owned(), v: svd.V().to_owned(), rank })
}

/// Singular values of `ofᵀ E cf` for the Gramians of type `typ`.
pub fn hankel_singular_values(
    sys: &LtiSystem,
    solver: &dyn MatrixEquationSolver,
    typ: GramianType,
) -> Result<Vec<f64>, MorError> {
    let factors = sys.gramian_factors(solver, typ)?;
    Ok(hankel_svd(sys, &factors.cf, &factors.of)?.sv)
}

/// Error bounds for every reduction order `1..=n`, the last one being zero.
///
/// Missing singular values (factors of rank below `n`) are taken equal to the
/// last computed one.
pub fn error_bounds(sv: &[f64], n: usize, typ: GramianType) -> Vec<f64> {
    let mut bounds = vec![0.0; n];
    let Some(&last) = sv.last() else {
        return bounds;
    };
    let padded: Vec<f64> = (0..n).map(|i| sv.get(i).copied().unwrap_or(last)).collect();
    let term = |s: f64| match typ {
        GramianType::Lyap => 2.0 * s,
        GramianType::Lqg => 2.0 * s / (1.0 + s * s).sqrt(),
        GramianType::Br(gamma) => 2.0 * gamma * s,
    };
    // bounds[i] = Σ_{j > i} term(σ_j)
    let mut acc = 0.0;
    for i in (0..n.saturating_sub(1)).rev() {
        acc += term(padded[i + 1]);
        bounds[i] = acc;
    }
    bounds
}

/// Reduce `sys` by balanced truncation.
///
/// Returns the reduced system, a reconstructor for the state, and the bases
/// with singular values and error bounds.
pub fn bt(
    sys: &LtiSystem,
    solver: &dyn MatrixEquationSolver,
    opts: &BtOptions,
) -> Result<(LtiSystem, GenericReconstructor, BtData), MorError> {
    let n = sys.n();
    if opts.r.is_none() && opts.tol.is_none() {
        return Err(MorError::Value("balanced truncation needs an order or a tolerance".into()));
    }
    if let Some(r) = opts.r {
        if r == 0 || r >= n {
            return Err(MorError::Value(format!("order {r} must satisfy 0 < r < {n}")));
        }
    }

    let GramianFactors { cf, of } = sys.gramian_factors(solver, opts.typ)?;
    if let Some(r) = opts.r {
        if r > cf.len().min(of.len()) {
            return Err(MorError::Value(format!(
                "order {r} exceeds the Gramian factor sizes ({}, {}); compute the factors more accurately",
                cf.len(),
                of.len()
            )));
        }
    }

    let svd = hankel_svd(sys, &cf, &of)?;
    let bounds = error_bounds(&svd.sv, n, opts.typ);

    let mut r = match opts.tol {
        Some(tol) => {
            let r_tol = bounds.iter().position(|&b| b <= tol).unwrap_or(0) + 1;
            debug!("tolerance {:e} needs order {}", tol, r_tol);
            opts.r.map_or(r_tol, |r| r.min(r_tol))
        }
        None => opts.r.unwrap_or(n),
    };
    if r > svd.rank {
        warn!("order {} exceeds the numerical rank {} of the Hankel product; reducing", r, svd.rank);
        r = svd.rank;
    }
    if r == 0 {
        return Err(MorError::Value("Gramian factors have numerical rank zero".into()));
    }

    // V = cf · v[:, ..r],  W = of · u[:, ..r]
    let v_coeffs = DenseVectorArray::from_columns(svd.v.as_ref().subcols(0, r));
    let w_coeffs = DenseVectorArray::from_columns(svd.u.as_ref().subcols(0, r));
    let mut v = VectorArrayOperator::new(cf).apply(&v_coeffs, &Indices::All)?;
    let mut w = VectorArrayOperator::new(of).apply(&w_coeffs, &Indices::All)?;

    let e_r = match opts.method {
        BtMethod::Sr => {
            for i in 0..r {
                let alpha = 1.0 / svd.sv[i].sqrt();
                v.scal(alpha, &Indices::from(i))?;
                w.scal(alpha, &Indices::from(i))?;
            }
            None
        }
        BtMethod::Bfsr => {
            v = gram_schmidt_copy(&v, None, &GramSchmidtOptions::no_pruning())?;
            w = gram_schmidt_copy(&w, None, &GramSchmidtOptions::no_pruning())?;
            Some(match &sys.e {
                Some(e) => project(e, Some(&w), Some(&v))?,
                None => project(&IdentityOperator::new(n), Some(&w), Some(&v))?,
            })
        }
    };

    let reduced = LtiSystem::new(
        project(&sys.a, Some(&w), Some(&v))?,
        project(&sys.b, Some(&w), None)?,
        project(&sys.c, None, Some(&v))?,
        sys.d.clone(),
        e_r,
    )?;
    info!("balanced truncation: order {} -> {} ({:?}, {:?})", n, r, opts.typ, opts.method);

    let data = BtData { v: v.clone(), w, sv: svd.sv, error_bounds: bounds };
    Ok((reduced, GenericReconstructor::new(v), data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lyapunov_bounds_sum_the_tail() {
        let b = error_bounds(&[4.0, 2.0, 1.0], 3, GramianType::Lyap);
        assert_eq!(b, vec![6.0, 2.0, 0.0]);
    }

    #[test]
    fn short_singular_value_lists_are_padded() {
        let b = error_bounds(&[3.0, 1.0], 4, GramianType::Br(0.5));
        // padded: 3, 1, 1, 1
        assert_eq!(b, vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn lqg_bounds_damp_large_values() {
        let b = error_bounds(&[1.0, 1.0], 2, GramianType::Lqg);
        assert_abs_diff_eq!(b[0], 2.0 / 2.0f64.sqrt(), epsilon = 1e-15);
        assert_eq!(b[1], 0.0);
    }
}
