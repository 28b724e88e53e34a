//! Full-order and reduced problem descriptions.

pub mod lti;
pub mod stationary;

pub use lti::{GramianFactors, GramianType, LtiSystem, PrecomputedGramians};
pub use stationary::StationaryProblem;
