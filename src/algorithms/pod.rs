//! Proper orthogonal decomposition via the method of snapshots.
//!
//! The Gram matrix of the snapshots is diagonalized; its leading eigenpairs
//! give the modes `Σ_j (e_i)_j a_j / sqrt(λ_i)`, which are orthonormal in the
//! inner product the Gram matrix was formed with.

use faer::{Mat, Side};
use tracing::{debug, info};

use crate::algorithms::gram_schmidt::{check_orthonormality, gram_schmidt};
use crate::config::{GramSchmidtOptions, PodOptions};
use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// Dominant modes of `a` together with their singular values (`sqrt(λ_i)`),
/// both in descending order.
///
/// Returns an empty array when no eigenvalue survives the truncation.
pub fn pod(
    a: &DenseVectorArray<f64>,
    product: Option<&dyn Operator>,
    opts: &PodOptions,
) -> Result<(DenseVectorArray<f64>, Vec<f64>), MorError> {
    if a.is_empty() || opts.modes == Some(0) {
        return Ok((DenseVectorArray::empty(a.dim(), 0), Vec::new()));
    }

    let mut gram = match product {
        None => a.gramian(&Indices::All)?,
        Some(p) => p.apply2(a, a, &Indices::All, &Indices::All)?,
    };
    if opts.symmetrize {
        let n = gram.nrows();
        gram = Mat::from_fn(n, n, |i, j| 0.5 * (gram[(i, j)] + gram[(j, i)]));
    }

    let evd = gram
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| MorError::EigenError(format!("{e:?}")))?;
    let n = gram.nrows();
    let evals = evd.S().column_vector();
    let evecs = evd.U();

    // eigenvalues come in ascending order
    let order: Vec<usize> = (0..n).rev().collect();
    let lambda_max = evals[order[0]];
    let mut keep: Vec<usize> = order
        .iter()
        .copied()
        .take_while(|&k| {
            let l = evals[k];
            l > 0.0 && l >= opts.rtol * lambda_max && l >= opts.atol
        })
        .collect();

    if let Some(fraction) = opts.energy {
        let total: f64 = order.iter().map(|&k| evals[k].max(0.0)).sum();
        if total > 0.0 {
            let mut acc = 0.0;
            let mut needed = keep.len();
            for (count, &k) in keep.iter().enumerate() {
                acc += evals[k];
                if acc / total >= fraction {
                    needed = count + 1;
                    break;
                }
            }
            keep.truncate(needed);
        }
    }
    if let Some(modes) = opts.modes {
        keep.truncate(modes);
    }

    if keep.is_empty() {
        info!("POD: no eigenvalue above tolerance (λ_max = {:e})", lambda_max);
        return Ok((DenseVectorArray::empty(a.dim(), 0), Vec::new()));
    }
    debug!("POD: keeping {} of {} modes", keep.len(), n);

    let coefficients = Mat::from_fn(keep.len(), n, |i, j| evecs[(j, keep[i])] / evals[keep[i]].sqrt());
    let mut modes = a.lincomb(coefficients.as_ref(), &Indices::All)?;
    let mut svals: Vec<f64> = keep.iter().map(|&k| evals[k].sqrt()).collect();

    if opts.orthonormalize {
        (modes, svals) = orthonormalize_modes(&modes, &svals, product)?;
    }
    if opts.check && !modes.is_empty() {
        check_orthonormality(&modes, product, 0, opts.check_tol)?;
    }

    Ok((modes, svals))
}

/// Re-orthonormalize the modes one at a time so each surviving mode keeps
/// its own singular value.
fn orthonormalize_modes(
    modes: &DenseVectorArray<f64>,
    svals: &[f64],
    product: Option<&dyn Operator>,
) -> Result<(DenseVectorArray<f64>, Vec<f64>), MorError> {
    let mut basis = DenseVectorArray::empty(modes.dim(), modes.len());
    let mut kept = Vec::with_capacity(svals.len());
    for (i, &s) in svals.iter().enumerate() {
        let offset = basis.len();
        basis.append(modes, &Indices::from(i))?;
        gram_schmidt(&mut basis, product, &GramSchmidtOptions::default().with_offset(offset).with_check(false))?;
        if basis.len() > offset {
            kept.push(s);
        } else {
            debug!("POD: mode {} lost to re-orthonormalization", i);
        }
    }
    Ok((basis, kept))
}
