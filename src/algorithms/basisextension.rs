//! Extending a reduced basis by new snapshot vectors.
//!
//! Each method returns the extended basis together with [`ExtensionData`], or
//! [`MorError::Extension`] when the new vectors add nothing to the basis.
//! The old basis is never modified; it is always a prefix of the new one.

use faer::Mat;
use tracing::{debug, info};

use crate::algorithms::gram_schmidt::gram_schmidt;
use crate::algorithms::pod::pod;
use crate::config::{FloatCmp, GramSchmidtOptions, PodOptions};
use crate::core::indices::Indices;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// Information about a finished extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionData {
    /// The old basis forms the leading vectors of the new one.
    pub hierarchic: bool,
}

impl ExtensionData {
    fn hierarchic() -> Self {
        Self { hierarchic: true }
    }
}

fn start_basis(basis: Option<&DenseVectorArray<f64>>, u: &DenseVectorArray<f64>, extra: usize) -> DenseVectorArray<f64> {
    match basis {
        Some(b) => {
            let mut b = b.clone();
            b.reserve(extra);
            b
        }
        None => DenseVectorArray::empty(u.dim(), extra),
    }
}

fn take_or_copy(
    target: &mut DenseVectorArray<f64>,
    u: &mut DenseVectorArray<f64>,
    u_ind: &Indices,
    copy_u: bool,
) -> Result<(), MorError> {
    if copy_u { target.append(u, u_ind) } else { target.append_take(u, u_ind) }
}

/// Append the selected vectors of `u` unchanged.
///
/// Fails if one of them already equals (within `cmp`) a vector of `basis`.
/// Linear independence is not checked. With `copy_u == false` the vectors
/// are moved out of `u`.
pub fn trivial_basis_extension(
    basis: Option<&DenseVectorArray<f64>>,
    u: &mut DenseVectorArray<f64>,
    u_ind: &Indices,
    copy_u: bool,
    cmp: FloatCmp,
) -> Result<(DenseVectorArray<f64>, ExtensionData), MorError> {
    let count = u_ind.len_in(u.len());
    if let Some(b) = basis {
        for j in 0..b.len() {
            let against = Indices::List(vec![j as isize; count]);
            if u.almost_equal(b, u_ind, &against, cmp.rtol, cmp.atol)?.into_iter().any(|eq| eq) {
                info!("Extension failed: vector already contained in basis (index {})", j);
                return Err(MorError::Extension(format!("new vector equals basis vector {j}")));
            }
        }
    }
    let mut new_basis = start_basis(basis, u, count);
    take_or_copy(&mut new_basis, u, u_ind, copy_u)?;
    Ok((new_basis, ExtensionData::hierarchic()))
}

/// Append the selected vectors of `u` and orthonormalize them against the
/// basis w.r.t. `product`.
///
/// Fails unless at least one new vector survives orthonormalization.
pub fn gram_schmidt_basis_extension(
    basis: Option<&DenseVectorArray<f64>>,
    u: &mut DenseVectorArray<f64>,
    u_ind: &Indices,
    copy_u: bool,
    product: Option<&dyn Operator>,
) -> Result<(DenseVectorArray<f64>, ExtensionData), MorError> {
    let basis_length = basis.map_or(0, DenseVectorArray::len);
    let mut new_basis = start_basis(basis, u, u_ind.len_in(u.len()));
    take_or_copy(&mut new_basis, u, u_ind, copy_u)?;
    gram_schmidt(&mut new_basis, product, &GramSchmidtOptions::default().with_offset(basis_length))?;

    if new_basis.len() <= basis_length {
        info!("Extension failed: Gram-Schmidt removed every new vector");
        return Err(MorError::Extension("new vectors are linearly dependent on the basis".into()));
    }
    debug!("basis extended from {} to {} vectors", basis_length, new_basis.len());
    Ok((new_basis, ExtensionData::hierarchic()))
}

/// Append the first `count` POD modes of the part of `u` the basis does not
/// represent yet.
///
/// The basis is expected to be orthonormal w.r.t. `product`. Modes whose
/// energy is negligible compared to the largest snapshot are discarded.
pub fn pod_basis_extension(
    basis: Option<&DenseVectorArray<f64>>,
    u: &DenseVectorArray<f64>,
    count: usize,
    product: Option<&dyn Operator>,
) -> Result<(DenseVectorArray<f64>, ExtensionData), MorError> {
    let basis_length = basis.map_or(0, DenseVectorArray::len);
    // energy below rtol of the largest snapshot is rounding noise of the projection
    let scale = match product {
        None => u.l2_norm(&Indices::All)?.into_iter().map(|n| n * n).fold(0.0, f64::max),
        Some(p) => p.pairwise_apply2(u, u, &Indices::All, &Indices::All)?.into_iter().fold(0.0, f64::max),
    };
    let mut opts = PodOptions::default().with_modes(count);
    opts.atol = opts.rtol * scale;

    let new_basis = match basis {
        None => pod(u, product, &opts)?.0,
        Some(b) => {
            let coefficients: Mat<f64> = match product {
                None => u.dot(b, &Indices::All, &Indices::All)?,
                Some(p) => p.apply2(u, b, &Indices::All, &Indices::All)?,
            };
            let mut projection_error = u.clone();
            let projection = b.lincomb(coefficients.as_ref(), &Indices::All)?;
            projection_error.axpy(-1.0, &projection, &Indices::All, &Indices::All)?;

            let (mut modes, _) = pod(&projection_error, product, &opts)?;
            let mut new_basis = start_basis(basis, u, modes.len());
            new_basis.append_take(&mut modes, &Indices::All)?;
            new_basis
        }
    };

    if new_basis.len() <= basis_length {
        info!("Extension failed: POD of the projection error is empty");
        return Err(MorError::Extension("no POD mode above tolerance".into()));
    }
    debug!("basis extended from {} to {} vectors", basis_length, new_basis.len());
    Ok((new_basis, ExtensionData::hierarchic()))
}

/// Extension method used by drivers such as [`greedy`](crate::algorithms::greedy::greedy).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BasisExtension {
    Trivial(FloatCmp),
    #[default]
    GramSchmidt,
    Pod { count: usize },
}

impl BasisExtension {
    /// Extend `basis` by all vectors of `u`, which are moved out of `u`.
    pub fn extend(
        &self,
        basis: Option<&DenseVectorArray<f64>>,
        u: &mut DenseVectorArray<f64>,
        product: Option<&dyn Operator>,
    ) -> Result<(DenseVectorArray<f64>, ExtensionData), MorError> {
        match *self {
            BasisExtension::Trivial(cmp) => trivial_basis_extension(basis, u, &Indices::All, false, cmp),
            BasisExtension::GramSchmidt => gram_schmidt_basis_extension(basis, u, &Indices::All, false, product),
            BasisExtension::Pod { count } => {
                let result = pod_basis_extension(basis, u, count, product)?;
                u.remove(&Indices::All)?;
                Ok(result)
            }
        }
    }
}
