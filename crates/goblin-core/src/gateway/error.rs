//! Gateway session-protocol errors

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`crate::gateway::GatewayServer`] dispatch.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A non-`initialize` request arrived before the session finished
    /// handshaking. JSON-RPC code `-32002` per `spec.md` §4.7.
    #[error("server not initialized")]
    NotInitialized,

    /// The request named a method the gateway does not implement.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A request's `params` did not match the expected shape.
    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },
}

/// Convenience result type for gateway dispatch.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
