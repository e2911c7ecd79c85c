//! Error types for session storage operations

use thiserror::Error;

/// Storage layer error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Core domain error: {0}")]
    Core(#[from] agent_smith_core::Error),
}

impl Error {
    pub fn session_not_found<S: Into<String>>(session_id: S) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::SessionNotFound { .. } => "session_not_found",
            Error::Core(err) => err.category(),
        }
    }
}

/// Convenience result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;
