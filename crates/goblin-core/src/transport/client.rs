//! Uniform client-side transport contract
//!
//! Descended from the teacher's `protocol::Transport` + `MessageHandler`
//! split, but reshaped from a server-side event-driven contract to a
//! client-side request/response one: Goblin's core job is being an MCP
//! *client* to many backends, not an MCP server to one.

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::protocol::JsonRpcMessage;
use crate::transport::error::ClientTransportResult;

/// Connection state common to every client-side transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Uniform contract every backend transport adapter implements
/// (`spec.md` §4.2): `connect`, `disconnect`, `isConnected`, `state`,
/// `send`, `receive`, `onClose`.
#[async_trait]
pub trait ClientTransport: Send + Sync {
    /// Establish the connection (spawn the child process, open the socket).
    async fn connect(&mut self) -> ClientTransportResult<()>;

    /// Close the connection cooperatively where possible.
    async fn disconnect(&mut self) -> ClientTransportResult<()>;

    /// Whether the transport believes itself connected right now.
    fn is_connected(&self) -> bool {
        self.state() == TransportState::Connected
    }

    /// Current connection state.
    fn state(&self) -> TransportState;

    /// Send one JSON-RPC frame to the backend.
    async fn send(&mut self, message: &JsonRpcMessage) -> ClientTransportResult<()>;

    /// Receive the next JSON-RPC frame from the backend, or `Ok(None)` if
    /// the transport closed cleanly.
    async fn receive(&mut self) -> ClientTransportResult<Option<JsonRpcMessage>>;

    /// Human-readable transport kind, for logging (`"stdio"`, `"http"`, ...).
    fn kind(&self) -> &'static str;
}
