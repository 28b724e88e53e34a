//! Operator constructions and affine decompositions.

pub mod constructions;
pub mod lincomb;

pub use constructions::{IdentityOperator, VectorArrayOperator};
pub use lincomb::LincombOperator;
