//! Aggregate error type for the gateway
//!
//! Each subsystem defines its own `thiserror` enum (`ConfigError`,
//! `TransportError`, `PoolError`, `RegistryError`, `RouterError`,
//! `GatewayError`, `SessionError`). `GoblinError` wraps them with `#[from]`
//! conversions so `?` composes across module boundaries, and maps every
//! variant to the JSON-RPC error code the front-side surface returns.
//!
//! Code allocation: `Timeout = -32001`, `SessionNotFound` /
//! `SessionOverCapacity = -32000` (both spec-mandated), everything else is
//! allocated from `-32010..-32020` in the order the error kinds are listed
//! in the taxonomy.

// Layer 1: Standard library imports

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::config::ConfigError;
use crate::correlation::CorrelationError;
use crate::gateway::GatewayError;
use crate::pool::PoolError;
use crate::registry::RegistryError;
use crate::router::RouterError;
use crate::session::SessionError;
use crate::transport::ClientTransportError;

/// Top-level gateway error, aggregating every subsystem error type.
#[derive(Debug, Error)]
pub enum GoblinError {
    /// Configuration failed to parse or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A client-side transport fault (connect/send/receive).
    #[error(transparent)]
    Transport(#[from] ClientTransportError),

    /// A backend call timed out or its correlation channel was dropped.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    /// Pool/lifecycle failure (unavailable backend, reconnect exhausted).
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Capability registry failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Routing/dispatch failure.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Gateway session-protocol failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Session manager failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Malformed MCP message; logged, call fails, connection preserved.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Backpressure rejection (queue full).
    #[error("busy: {0}")]
    Busy(String),

    /// Caller or session closed the in-flight call.
    #[error("cancelled")]
    Cancelled,
}

impl GoblinError {
    /// Numeric JSON-RPC error code for this error, per the taxonomy in
    /// `spec.md` §7.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            GoblinError::Router(RouterError::Timeout { .. }) => -32001,
            GoblinError::Session(SessionError::NotFound { .. }) => -32000,
            GoblinError::Session(SessionError::OverCapacity { .. }) => -32000,
            GoblinError::Session(_) => -32018,
            GoblinError::Correlation(CorrelationError::Timeout { .. }) => -32001,
            GoblinError::Config(_) => -32010,
            GoblinError::Transport(_) | GoblinError::Correlation(_) => -32011,
            GoblinError::Protocol(_) => -32012,
            GoblinError::Pool(_) => -32013,
            GoblinError::Registry(RegistryError::UnknownCapability { .. }) => -32014,
            GoblinError::Registry(_) => -32015,
            GoblinError::Router(RouterError::OutputTooLarge { .. }) => -32016,
            GoblinError::Router(_) => -32017,
            GoblinError::Gateway(GatewayError::NotInitialized) => -32002,
            GoblinError::Gateway(_) => -32018,
            GoblinError::Cancelled => -32019,
            GoblinError::Busy(_) => -32020,
        }
    }

    /// Human-readable message suitable for the JSON-RPC error `message` field.
    pub fn json_rpc_message(&self) -> String {
        self.to_string()
    }
}

/// Convenience result type for gateway-level operations.
pub type GoblinResult<T> = std::result::Result<T, GoblinError>;
