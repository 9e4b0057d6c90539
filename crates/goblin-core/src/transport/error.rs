//! Client-side transport errors
//!
//! Mirrors the fatal/non-fatal split from `spec.md` §4.2: a `Fatal` error
//! triggers the pool's reconnect policy, a `Protocol` error is logged and
//! fails only the in-flight call.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by a [`crate::transport::ClientTransport`] implementation.
#[derive(Debug, Error)]
pub enum ClientTransportError {
    /// Connection-level fault: spawn failure, socket reset, process exit.
    /// Fatal — the pool MUST treat the transport as down and reconnect.
    #[error("transport fault: {0}")]
    Fatal(String),

    /// A malformed MCP message was sent or received. Non-fatal — the
    /// connection is preserved, only the offending call fails.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transport was asked to send/receive while not connected.
    #[error("not connected")]
    NotConnected,

    /// Graceful close did not complete within the grace period.
    #[error("close timed out after {0:?}")]
    CloseTimeout(std::time::Duration),
}

/// Convenience result type for client transport operations.
pub type ClientTransportResult<T> = std::result::Result<T, ClientTransportError>;
