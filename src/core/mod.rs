//! Core abstractions: index selectors, parameters and operator traits.

pub mod indices;
pub mod parameter;
pub mod traits;

pub use indices::Indices;
pub use parameter::{Coefficient, Parameter, ParameterFunctional, ProjectionParameterFunctional};
pub use traits::{MatrixEquationSolver, Operator};
