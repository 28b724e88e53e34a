use thiserror::Error;

// Unified error type for morkit

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MorError {
    #[error("basis extension failed: {0}")]
    Extension(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("index {index} out of range for array of length {len}")]
    Index { index: isize, len: usize },
    #[error("communication required: {0}")]
    Communication(String),
    #[error("invalid value: {0}")]
    Value(String),
    #[error("accuracy check failed: {0}")]
    Accuracy(String),
    #[error("factorization error: {0}")]
    FactorError(String),
    #[error("eigenvalue decomposition failed: {0}")]
    EigenError(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl MorError {
    /// True for failures a greedy driver treats as a stopping condition.
    pub fn is_extension(&self) -> bool {
        matches!(self, MorError::Extension(_))
    }
}
