//! goblin-core: the request-multiplexing engine behind the Goblin MCP gateway
//!
//! Goblin aggregates many MCP servers behind one front-side MCP surface. A
//! client message enters through [`gateway`], is dispatched through
//! [`router`], which consults [`registry`] to locate the owning backend,
//! acquired from [`pool`] as a live [`backend`] connection bound to a
//! [`transport`] adapter. Backend-originated notifications flow the reverse
//! path, with [`registry`] folding change events and [`gateway`]
//! rebroadcasting to subscribed sessions. [`config`] and [`reconcile`]
//! drive [`pool`] and [`registry`] whenever configuration changes.
//!
//! # Module map
//!
//! - [`config`] — on-disk config shape, validation, hot-reload watcher
//! - [`reconcile`] — diffs config snapshots, drives the pool/registry
//! - [`transport`] — client-side transport adapters (stdio/HTTP/SSE/streamable-HTTP)
//! - [`backend`] — one live MCP connection to a configured server
//! - [`pool`] — connection lifecycle, circuit breaking, idle disconnection
//! - [`registry`] — the union capability set across Ready backends
//! - [`router`] — qualified-name dispatch, timeouts, output-size enforcement
//! - [`session`] — front-side session indexing, resumption, idle GC
//! - [`gateway`] — the front-facing MCP surface: dispatch and notification fan-out
//! - [`authentication`] — front-side credential checking (apikey / none)
//! - [`protocol`] — JSON-RPC 2.0 framing and MCP wire types
//! - [`correlation`] — request/response correlation for backend connections

pub mod authentication;
pub mod backend;
pub mod config;
pub mod correlation;
pub mod error;
pub mod gateway;
pub mod pool;
pub mod protocol;
pub mod reconcile;
pub mod registry;
pub mod router;
pub mod session;
pub mod transport;

pub use error::{GoblinError, GoblinResult};

pub use protocol::{
    Base64Data,
    ClientInfo,
    JsonRpcError,
    JsonRpcMessage,
    JsonRpcMessageTrait,
    JsonRpcNotification,
    JsonRpcRequest,
    JsonRpcResponse,
    MimeType,
    ProtocolError,
    ProtocolResult,
    ProtocolVersion,
    RequestId,
    ServerInfo,
    Uri,
};

pub use correlation::{CorrelationConfig, CorrelationError, CorrelationManager, CorrelationResult};

pub use transport::{build_transport, ClientTransport, ClientTransportError, TransportState};

pub use backend::{Backend, BackendClient, BackendState};

pub use pool::{Pool, PoolError};

pub use registry::{CapabilityCard, Registry, RegistryError};

pub use router::{CallContext, Router, RouterError};

pub use session::{SessionHandle, SessionManager, SessionState};

pub use gateway::GatewayServer;

pub use reconcile::Reconciler;

pub use config::{ConfigSnapshot, ConfigWatcher};

/// The crate version, read from `Cargo.toml` at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}
