//! Error types for pa-dash
//!
//! Defines the dashboard error type using thiserror for clear error propagation.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Main error type for the dashboard library
#[derive(Error, Debug)]
pub enum DashError {
    /// Remote gateway call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Local cache database error
    #[error("Cache error: {0}")]
    Cache(#[from] sqlx::Error),

    /// pa-common error (configuration, model parsing)
    #[error("Common error: {0}")]
    Common(#[from] pa_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of cached payloads
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request from the user
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience Result type using DashError
pub type DashResult<T> = std::result::Result<T, DashError>;
