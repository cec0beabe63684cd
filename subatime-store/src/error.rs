//! Store error types.

use thiserror::Error;

/// Error type for configuration and persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
