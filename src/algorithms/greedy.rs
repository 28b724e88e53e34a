//! Weak greedy construction of a reduced basis.
//!
//! Each round reduces the problem onto the current basis, evaluates the error
//! (estimated or true) at every training parameter, and extends the basis by
//! the full-order solution at the worst parameter. The loop ends when the
//! error target is met, the extension limit is reached, or the extension
//! method reports that the new snapshot adds nothing.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::algorithms::basisextension::BasisExtension;
use crate::core::indices::Indices;
use crate::core::parameter::Parameter;
use crate::core::traits::Operator;
use crate::discretizations::StationaryProblem;
use crate::error::MorError;
use crate::reductors::basic::{GenericReconstructor, ReductionData};
use crate::reductors::linear::reduce_stationary_affine_linear;
use crate::vectorarray::DenseVectorArray;

/// Greedy stopping criteria and collaborators.
#[derive(Clone, Default)]
pub struct GreedyOptions {
    pub extension: BasisExtension,
    /// Inner product for the error estimator and for orthonormalization.
    pub error_product: Option<Arc<dyn Operator>>,
    pub max_extensions: Option<usize>,
    /// Stop once the maximum error is at most `atol`.
    pub atol: Option<f64>,
    /// Evaluate the true error instead of the estimate; needs a full solve
    /// per training parameter and round.
    pub use_true_error: bool,
}

impl fmt::Debug for GreedyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreedyOptions")
            .field("extension", &self.extension)
            .field("error_product", &self.error_product.is_some())
            .field("max_extensions", &self.max_extensions)
            .field("atol", &self.atol)
            .field("use_true_error", &self.use_true_error)
            .finish()
    }
}

impl GreedyOptions {
    pub fn with_max_extensions(mut self, max_extensions: usize) -> Self {
        self.max_extensions = Some(max_extensions);
        self
    }

    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = Some(atol);
        self
    }

    pub fn with_extension(mut self, extension: BasisExtension) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_error_product(mut self, product: Arc<dyn Operator>) -> Self {
        self.error_product = Some(product);
        self
    }
}

/// Outcome of [`greedy`].
#[derive(Debug, Clone)]
pub struct GreedyResult {
    pub basis: DenseVectorArray<f64>,
    pub reduced: StationaryProblem,
    pub reconstructor: GenericReconstructor,
    pub data: ReductionData,
    /// Maximum error over the training set before each extension.
    pub max_errors: Vec<f64>,
    pub max_error_mus: Vec<Parameter>,
    pub extensions: usize,
}

fn norm(u: &DenseVectorArray<f64>, product: Option<&dyn Operator>) -> Result<f64, MorError> {
    match product {
        None => Ok(u.l2_norm(&Indices::All)?[0]),
        Some(p) => Ok(p.pairwise_apply2(u, u, &Indices::All, &Indices::All)?[0].max(0.0).sqrt()),
    }
}

fn finish(
    problem: &StationaryProblem,
    basis: Option<DenseVectorArray<f64>>,
    (reduced, reconstructor, data): (StationaryProblem, GenericReconstructor, ReductionData),
    max_errors: Vec<f64>,
    max_error_mus: Vec<Parameter>,
    extensions: usize,
) -> GreedyResult {
    GreedyResult {
        basis: basis.unwrap_or_else(|| DenseVectorArray::empty(problem.dim_solution(), 0)),
        reduced,
        reconstructor,
        data,
        max_errors,
        max_error_mus,
        extensions,
    }
}

/// Build a reduced basis for `problem` over `training_set`.
pub fn greedy(
    problem: &StationaryProblem,
    training_set: &[Parameter],
    opts: &GreedyOptions,
) -> Result<GreedyResult, MorError> {
    if training_set.is_empty() {
        return Err(MorError::Value("greedy needs a non-empty training set".into()));
    }
    let product = opts.error_product.as_deref();
    info!("Started greedy search on {} training parameters", training_set.len());

    let mut basis: Option<DenseVectorArray<f64>> = None;
    let mut extends: Option<ReductionData> = None;
    let mut max_errors = Vec::new();
    let mut max_error_mus = Vec::new();
    let mut extensions = 0;

    loop {
        let (rd, rc, data) = reduce_stationary_affine_linear(problem, basis.as_ref(), product, extends.take())?;

        let mut worst: Option<(f64, &Parameter)> = None;
        for mu in training_set {
            let u = rd.solve(Some(mu))?;
            let err = if opts.use_true_error {
                let mut diff = problem.solve(Some(mu))?;
                diff.axpy(-1.0, &rc.reconstruct(&u)?, &Indices::All, &Indices::All)?;
                norm(&diff, product)?
            } else {
                rd.estimate(&u, Some(mu))?
            };
            if worst.is_none_or(|(e, _)| err > e) {
                worst = Some((err, mu));
            }
        }
        let Some((max_err, max_err_mu)) = worst else {
            return Err(MorError::Value("greedy needs a non-empty training set".into()));
        };
        info!("Maximum error after {} extensions: {:e} (mu = {})", extensions, max_err, max_err_mu);
        max_errors.push(max_err);
        max_error_mus.push(max_err_mu.clone());

        if opts.atol.is_some_and(|atol| max_err <= atol) {
            info!("Reached maximal error on training set");
            return Ok(finish(problem, basis, (rd, rc, data), max_errors, max_error_mus, extensions));
        }

        let mut snapshot = problem.solve(Some(max_err_mu))?;
        match opts.extension.extend(basis.as_ref(), &mut snapshot, product) {
            Ok((new_basis, extension_data)) => {
                basis = Some(new_basis);
                extensions += 1;
                if extension_data.hierarchic {
                    extends = Some(data);
                } else {
                    warn!("Extension algorithm did not report a hierarchic basis; reducing from scratch");
                }
            }
            Err(e) if e.is_extension() => {
                info!("Extension failed. Stopping now.");
                return Ok(finish(problem, basis, (rd, rc, data), max_errors, max_error_mus, extensions));
            }
            Err(e) => return Err(e),
        }

        if opts.max_extensions.is_some_and(|max| extensions >= max) {
            info!("Maximal number of {} extensions reached.", extensions);
            let reduction = reduce_stationary_affine_linear(problem, basis.as_ref(), product, extends.take())?;
            return Ok(finish(problem, basis, reduction, max_errors, max_error_mus, extensions));
        }
    }
}
