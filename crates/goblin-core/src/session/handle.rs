//! One front-side client connection's state

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::time::Instant;

// Layer 2: Third-party crate imports
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::protocol::{ClientInfo, JsonRpcMessage, ProtocolVersion};
use crate::registry::RegistrySnapshot;

/// Lifecycle state machine enforced by the gateway server before a request
/// other than `initialize` is allowed to reach the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Initialized,
    Active,
    Closing,
    Closed,
}

/// Bound on a session's outbound notification queue; overflow drops the
/// oldest buffered notification, which is exactly what a lagging
/// `broadcast::Receiver` does, so the channel itself is the backpressure
/// policy (`spec.md` §5).
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Everything the gateway and session manager track about one client.
pub struct Session {
    pub id: Uuid,
    pub transport_kind: String,
    pub protocol_version: Option<ProtocolVersion>,
    pub client_info: Option<ClientInfo>,
    pub created_at: Instant,
    pub last_activity: Instant,
    pub state: SessionState,
    pub subscriptions: HashSet<String>,
    pub compatibility_mode: bool,
    pub frozen_registry: Option<RegistrySnapshot>,
    pub dropped_notifications: u64,
}

impl Session {
    pub fn new(id: Uuid, transport_kind: impl Into<String>, compatibility_mode: bool) -> Self {
        let now = Instant::now();
        Self {
            id,
            transport_kind: transport_kind.into(),
            protocol_version: None,
            client_info: None,
            created_at: now,
            last_activity: now,
            state: SessionState::New,
            subscriptions: HashSet::new(),
            compatibility_mode,
            frozen_registry: None,
            dropped_notifications: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> std::time::Duration {
        Instant::now().duration_since(self.last_activity)
    }
}

/// Owning handle the session manager indexes by id: the mutable session
/// record plus its outbound notification broadcast channel.
pub struct SessionHandle {
    pub session: Mutex<Session>,
    outbound_tx: broadcast::Sender<JsonRpcMessage>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        let (outbound_tx, _) = broadcast::channel(OUTBOUND_QUEUE_CAPACITY);
        Self {
            session: Mutex::new(session),
            outbound_tx,
        }
    }

    /// Subscribe to this session's outbound notification stream; the
    /// serving transport drains it to push notifications to the client.
    pub fn subscribe_outbound(&self) -> broadcast::Receiver<JsonRpcMessage> {
        self.outbound_tx.subscribe()
    }

    /// Enqueue a notification. Never blocks and never fails on a full
    /// queue: a lagging receiver simply observes `Lagged` and the session's
    /// drop counter is incremented by its own drain loop.
    pub fn notify(&self, message: JsonRpcMessage) {
        let _ = self.outbound_tx.send(message);
    }
}
