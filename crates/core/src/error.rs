//! Core Error Types
//!
//! Error taxonomy for the two things the client does against the backend:
//! running a streamed generation and reading persisted revisions. The two are
//! kept apart so callers can never confuse "generation failed" with "could not
//! check revisions", and neither is ever used to express "no revisions yet".

use thiserror::Error;

use crate::types::CaseId;

/// Errors that terminate (or prevent) a generation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Backend answered with a non-success status, before or during the stream.
    #[error("Generation failed with HTTP {status}: {reason}")]
    Transport { status: u16, reason: String },

    /// Connection-level failure (refused, reset, read error).
    #[error("Network error: {0}")]
    Network(String),

    /// A run for this case is already in flight.
    #[error("Generation already running for case {case_id}")]
    Conflict { case_id: CaseId },

    /// Byte sequence that is not valid UTF-8 even after boundary carry.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Caller-supplied deadline elapsed before the stream ended.
    #[error("Generation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Run was cancelled by its owner.
    #[error("Generation cancelled")]
    Cancelled,
}

/// Result type alias for generation errors
pub type GenerationResult<T> = Result<T, GenerationError>;

impl GenerationError {
    /// Create a transport error
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            status,
            reason: reason.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a conflict error for the given case
    pub fn conflict(case_id: impl Into<CaseId>) -> Self {
        Self::Conflict {
            case_id: case_id.into(),
        }
    }

    /// Whether a fresh, manually triggered `start` could succeed.
    ///
    /// Conflicts and cancellations are not generation failures and are never
    /// worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Transport { .. }
                | GenerationError::Network(_)
                | GenerationError::Decode(_)
                | GenerationError::Timeout { .. }
        )
    }

    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            GenerationError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while listing or fetching persisted revisions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    /// Backend answered with a non-success status.
    #[error("Revision request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for revision errors
pub type RevisionResult<T> = Result<T, RevisionError>;

impl RevisionError {
    /// Create an HTTP status error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<GenerationError> for String {
    fn from(err: GenerationError) -> String {
        err.to_string()
    }
}

impl From<RevisionError> for String {
    fn from(err: RevisionError) -> String {
        err.to_string()
    }
}
