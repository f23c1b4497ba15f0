//! Error types for carbonweb-store

use thiserror::Error;

/// Persistence error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No snapshot found at {location}")]
    NotFound { location: String },

    #[error("Invalid snapshot at {location}: {message}")]
    InvalidSnapshot { location: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
