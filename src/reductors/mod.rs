//! Reductors: projection of full-order problems onto reduced bases.

pub mod basic;
pub mod bt;
pub mod linear;

pub use basic::{
    GenericReconstructor, ReductionData, project, project_lincomb, reduce_generic_pg, reduce_generic_rb,
    reduce_to_subbasis,
};
pub use bt::{BtData, BtMethod, BtOptions, bt, error_bounds, hankel_singular_values};
pub use linear::{ResidualData, ResidualEstimator, reduce_stationary_affine_linear};
