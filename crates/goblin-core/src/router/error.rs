//! Router errors

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`crate::router::Router`] dispatch.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Alias/qualified name not found in the registry.
    #[error("unknown capability: {name}")]
    UnknownCapability { name: String },

    /// Call exceeded its deadline.
    #[error("call to {name} timed out after {deadline:?}")]
    Timeout { name: String, deadline: Duration },

    /// Result exceeded `policies.outputSizeLimit`.
    #[error("result from {name} exceeded {limit} bytes, truncated preview follows")]
    OutputTooLarge {
        name: String,
        limit: usize,
        preview: String,
    },

    /// The resolved backend is not currently reachable.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Convenience result type for router dispatch.
pub type RouterResult<T> = std::result::Result<T, RouterError>;
