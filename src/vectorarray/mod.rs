//! Vector arrays: ordered collections of equally sized vectors with bulk
//! linear-algebra operations.

mod dense;
pub use dense::DenseVectorArray;
