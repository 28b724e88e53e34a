//! morkit: model order reduction over Faer
//!
//! This crate provides vector arrays with indexed bulk operations, Gram-Schmidt and POD based
//! basis generation, Galerkin/Petrov-Galerkin reductors with residual-based error estimation,
//! and balanced truncation for LTI systems.

pub mod parallel;

pub mod algorithms;
pub mod config;
pub mod core;
pub mod discretizations;
pub mod error;
pub mod matrix;
pub mod operators;
pub mod reductors;
pub mod utils;
pub mod vectorarray;

// Re-exports for convenience
pub use algorithms::*;
pub use config::*;
pub use crate::core::*;
pub use discretizations::*;
pub use error::*;
pub use matrix::*;
pub use operators::*;
pub use reductors::*;
pub use vectorarray::*;

pub use parallel::{ArrayHandle, RemoteArray};
