//! Error types for the vector index

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Vector index errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// A vector's length does not match the index dimensionality
    #[error("dimension mismatch: index expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The index was created with an unusable dimensionality
    #[error("invalid index dimensionality: {0}")]
    InvalidDimensions(usize),

    /// An internal invariant was violated; the index cannot be trusted
    #[error("index corruption detected: {0}")]
    Corruption(String),
}
