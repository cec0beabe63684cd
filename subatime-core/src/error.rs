//! Core error types for subatime.

use thiserror::Error;

/// Core error type for subatime operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Platform not found or not configured.
    #[error("Platform not found: {0}")]
    PlatformNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from an acquisition source.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
