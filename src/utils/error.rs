//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use abogabot_api::ClientBuildError;
use abogabot_core::{GenerationError, RevisionError};

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generation run failures (auto-converted from GenerationError)
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Revision read failures (auto-converted from RevisionError)
    #[error("Revision error: {0}")]
    Revision(#[from] RevisionError),

    /// Backend client could not be built
    #[error("Client error: {0}")]
    Client(#[from] ClientBuildError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convert AppError to a string suitable for display
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
