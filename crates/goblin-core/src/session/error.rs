//! Session manager errors

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`crate::session::SessionManager`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unknown or expired session id; client must re-initialize.
    #[error("session {id} not found")]
    NotFound { id: uuid::Uuid },

    /// `maxSessions` reached.
    #[error("session capacity ({max}) reached")]
    OverCapacity { max: usize },

    /// Request arrived before the session completed `initialize`.
    #[error("session {id} is not yet initialized")]
    NotInitialized { id: uuid::Uuid },
}

/// Convenience result type for session manager operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
