//! Unified error types for shotdiff

use thiserror::Error;

/// Unified error type for all shotdiff operations
#[derive(Error, Debug)]
pub enum ShotdiffError {
    // Known-inconsistency rule errors
    #[error("Invalid pattern {pattern:?} in known-inconsistency rule {index}: {message}")]
    InvalidRule {
        index: usize,
        pattern: String,
        message: String,
    },

    // Row filter errors
    #[error("Invalid row filter: {0}")]
    InvalidFilter(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using ShotdiffError
pub type Result<T> = std::result::Result<T, ShotdiffError>;
