//! Pool and lifecycle-manager errors

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`crate::pool::Pool`] operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No such backend configured.
    #[error("unknown backend: {server}")]
    UnknownBackend { server: String },

    /// Circuit open or the backend failed to (re)connect.
    #[error("backend {server} unavailable: {reason}")]
    BackendUnavailable { server: String, reason: String },

    /// Per-backend outbound queue is full.
    #[error("backend {server} is busy")]
    Busy { server: String },
}

/// Convenience result type for pool operations.
pub type PoolResult<T> = std::result::Result<T, PoolError>;
