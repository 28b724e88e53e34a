//! Matrix module: dense and sparse matrix operators.

pub mod dense;
pub use dense::MatrixOperator;
pub mod sparse;
pub use sparse::CsrMatrix;
