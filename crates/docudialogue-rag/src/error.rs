//! Error types for the RAG core

use docudialogue_index::IndexError;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG core errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (bad sampling parameters, missing settings, ...)
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding provider could not be reached or loaded
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A vector's dimensionality does not match the index
    #[error("dimension mismatch: index expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A document could not be read or yielded no text
    #[error("document '{document}' unreadable: {message}")]
    DocumentUnreadable { document: String, message: String },

    /// The backend rejected the configured credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend throttled the request
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend could not be reached
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend accepted the request but failed to serve it
    #[error("provider error: {0}")]
    Provider(String),

    /// An index invariant was violated; fatal, never auto-repaired
    #[error("index corruption: {0}")]
    IndexCorruption(String),

    /// A generation is already streaming on this session
    #[error("a response is already streaming for this session")]
    SessionBusy,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an embedding-unavailable error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create a document-unreadable error
    pub fn unreadable(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentUnreadable {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, got } => {
                Error::DimensionMismatch { expected, got }
            }
            IndexError::InvalidDimensions(dims) => {
                Error::Config(format!("invalid embedding dimensionality: {dims}"))
            }
            IndexError::Corruption(message) => Error::IndexCorruption(message),
        }
    }
}
