//! Error types for Space Atlas.

use thiserror::Error;

/// Top-level error type for Atlas operations.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Atlas operations.
pub type AtlasResult<T> = Result<T, AtlasError>;
