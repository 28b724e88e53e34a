pub mod float_cmp;

pub use float_cmp::{float_cmp, float_cmp_all};
