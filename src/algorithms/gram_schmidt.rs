//! Modified Gram-Schmidt orthonormalization with reiteration.
//!
//! Vectors from `offset` onward are orthonormalized against all preceding
//! accepted vectors, optionally w.r.t. an inner-product operator. A vector is
//! projected again as long as a pass removes most of its norm (loss of
//! orthogonality from cancellation), and dropped when its residual becomes
//! negligible compared to its initial norm.
//!
//! # References
//! - Giraud, Langou, Rozložník, Van den Eshof (2005). Rounding error analysis
//!   of the classical Gram-Schmidt orthogonalization process.

use tracing::{debug, info};

use crate::config::GramSchmidtOptions;
use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

fn norm(a: &DenseVectorArray<f64>, i: usize, product: Option<&dyn Operator>) -> Result<f64, MorError> {
    let ind = Indices::from(i);
    match product {
        None => Ok(a.l2_norm(&ind)?[0]),
        Some(p) => Ok(p.pairwise_apply2(a, a, &ind, &ind)?[0].max(0.0).sqrt()),
    }
}

fn inner(a: &DenseVectorArray<f64>, j: usize, i: usize, product: Option<&dyn Operator>) -> Result<f64, MorError> {
    let (ind_j, ind_i) = (Indices::from(j), Indices::from(i));
    match product {
        None => Ok(a.pairwise_dot(a, &ind_j, &ind_i)?[0]),
        Some(p) => Ok(p.pairwise_apply2(a, a, &ind_j, &ind_i)?[0]),
    }
}

/// Orthonormalize `a` in place; linearly dependent vectors are removed.
pub fn gram_schmidt(
    a: &mut DenseVectorArray<f64>,
    product: Option<&dyn Operator>,
    opts: &GramSchmidtOptions,
) -> Result<(), MorError> {
    let offset = opts.offset;
    if offset > a.len() {
        return Err(MorError::Value(format!(
            "offset {} exceeds array length {}",
            offset,
            a.len()
        )));
    }
    let mut removed = vec![false; a.len()];

    for i in offset..a.len() {
        let initial_norm = norm(a, i, product)?;
        if initial_norm < opts.atol {
            info!("Removing vector {} of norm {:e}", i, initial_norm);
            removed[i] = true;
            continue;
        }

        if i == 0 {
            if initial_norm > 0.0 {
                a.scal(1.0 / initial_norm, &Indices::from(0usize))?;
            }
            continue;
        }

        let mut norm_i = initial_norm;
        let mut first_iteration = true;
        loop {
            if !first_iteration {
                info!("Orthonormalizing vector {} again", i);
            }
            first_iteration = false;

            // orthogonalize against every accepted vector before i
            for j in (0..i).filter(|&j| !removed[j]) {
                let p = inner(a, j, i, product)?;
                a.axpy_self(-p, &Indices::from(i), &Indices::from(j))?;
            }

            let old_norm = norm_i;
            norm_i = norm(a, i, product)?;

            if norm_i < opts.rtol * initial_norm {
                info!("Removing linearly dependent vector {}", i);
                removed[i] = true;
                break;
            }
            if !(opts.reiterate && norm_i / old_norm < opts.reiteration_threshold) {
                break;
            }
        }

        if !removed[i] && norm_i > 0.0 {
            a.scal(1.0 / norm_i, &Indices::from(i))?;
        }
    }

    let remove: Vec<usize> = (0..removed.len()).filter(|&i| removed[i]).collect();
    if !remove.is_empty() {
        debug!("removing {} of {} vectors", remove.len(), a.len());
        a.remove(&Indices::from(remove))?;
    }

    if opts.check && offset < a.len() {
        check_orthonormality(a, product, offset, opts.check_tol)?;
    }
    Ok(())
}

/// Orthonormalized copy of `a`; the input is left untouched.
pub fn gram_schmidt_copy(
    a: &DenseVectorArray<f64>,
    product: Option<&dyn Operator>,
    opts: &GramSchmidtOptions,
) -> Result<DenseVectorArray<f64>, MorError> {
    let mut out = a.copy(&Indices::All)?;
    gram_schmidt(&mut out, product, opts)?;
    Ok(out)
}

/// Fail with [`MorError::Accuracy`] unless `a[offset..]` is orthonormal to all of `a`.
pub fn check_orthonormality(
    a: &DenseVectorArray<f64>,
    product: Option<&dyn Operator>,
    offset: usize,
    tol: f64,
) -> Result<(), MorError> {
    let new = Indices::range(offset, a.len());
    let gram = match product {
        None => a.dot(a, &new, &Indices::All)?,
        Some(p) => p.apply2(a, a, &new, &Indices::All)?,
    };
    let mut max_err: f64 = 0.0;
    for i in 0..gram.nrows() {
        for j in 0..gram.ncols() {
            let expected = if j == offset + i { 1.0 } else { 0.0 };
            max_err = max_err.max((gram[(i, j)] - expected).abs());
        }
    }
    if max_err > tol {
        return Err(MorError::Accuracy(format!(
            "result not orthonormal (max error {max_err:e} > {tol:e})"
        )));
    }
    Ok(())
}
