//! Tolerances and switches for the orthonormalization and POD algorithms.
//!
//! Every struct has a `Default` matching the values the algorithms were tuned
//! with, plus `with_*` setters for the knobs callers most often change.

/// Gram-Schmidt tolerances & switches.
#[derive(Debug, Clone, PartialEq)]
pub struct GramSchmidtOptions {
    /// Vectors with initial norm below `atol` are removed.
    pub atol: f64,

    /// Vectors whose norm after projection drops below `rtol` times their
    /// initial norm are removed as linearly dependent.
    pub rtol: f64,

    /// Number of leading vectors that are already orthonormal.
    pub offset: usize,

    /// Repeat the projection pass while it shrinks the vector strongly.
    pub reiterate: bool,

    /// A pass that leaves less than this fraction of the norm triggers another pass.
    pub reiteration_threshold: f64,

    /// Verify orthonormality of the new vectors afterwards.
    pub check: bool,

    /// Maximal entry deviation from the identity accepted by `check`.
    pub check_tol: f64,
}

impl Default for GramSchmidtOptions {
    fn default() -> Self {
        Self {
            atol: 1e-13,
            rtol: 1e-13,
            offset: 0,
            reiterate: true,
            reiteration_threshold: 1e-1,
            check: true,
            check_tol: 1e-3,
        }
    }
}

impl GramSchmidtOptions {
    /// Accept every vector, however small its residual.
    pub fn no_pruning() -> Self {
        Self { atol: 0.0, rtol: 0.0, ..Self::default() }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }
}

/// POD truncation criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct PodOptions {
    /// Maximal number of modes.
    pub modes: Option<usize>,

    /// Eigenvalues below `rtol * λ_max` are discarded.
    pub rtol: f64,

    /// Eigenvalues below `atol` are discarded.
    pub atol: f64,

    /// Keep the smallest leading set of modes capturing this fraction of the
    /// total energy (sum of eigenvalues).
    pub energy: Option<f64>,

    /// Symmetrize the Gram matrix before the eigendecomposition.
    pub symmetrize: bool,

    /// Re-orthonormalize the modes with Gram-Schmidt.
    pub orthonormalize: bool,

    /// Verify orthonormality of the modes.
    pub check: bool,

    pub check_tol: f64,
}

impl Default for PodOptions {
    fn default() -> Self {
        Self {
            modes: None,
            rtol: 4e-8,
            atol: 0.0,
            energy: None,
            symmetrize: true,
            orthonormalize: true,
            check: true,
            check_tol: 1e-10,
        }
    }
}

impl PodOptions {
    pub fn with_modes(mut self, modes: usize) -> Self {
        self.modes = Some(modes);
        self
    }

    pub fn with_energy(mut self, fraction: f64) -> Self {
        self.energy = Some(fraction);
        self
    }
}

/// Tolerances for [`almost_equal`](crate::vectorarray::DenseVectorArray::almost_equal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatCmp {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for FloatCmp {
    fn default() -> Self {
        Self {
            rtol: crate::utils::float_cmp::DEFAULT_RTOL,
            atol: crate::utils::float_cmp::DEFAULT_ATOL,
        }
    }
}
