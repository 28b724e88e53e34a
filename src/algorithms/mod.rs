//! Basis generation algorithms.

pub mod basisextension;
pub mod gram_schmidt;
pub mod greedy;
pub mod pod;

pub use basisextension::{
    BasisExtension, ExtensionData, gram_schmidt_basis_extension, pod_basis_extension, trivial_basis_extension,
};
pub use gram_schmidt::{check_orthonormality, gram_schmidt, gram_schmidt_copy};
pub use greedy::{GreedyOptions, GreedyResult, greedy};
pub use pod::pod;
