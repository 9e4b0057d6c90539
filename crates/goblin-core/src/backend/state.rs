//! Backend state: the live projection of a `ServerSpec`

// Layer 1: Standard library imports
use std::time::Instant;

// Layer 3: Internal module imports
use crate::config::ServerSpec;
use crate::protocol::{InitializeResponse, ProtocolVersion, ServerCapabilities, ServerInfo};
use crate::registry::card::CapabilityKind;

/// Lifecycle state of a backend connection (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Disconnected,
    Connecting,
    Ready,
    Degraded,
    Failed,
    Evicted,
}

/// The live projection of a `ServerSpec`: everything the pool and registry
/// need to know about one backend beyond its static configuration.
///
/// Owned by the pool; the registry only ever holds the backend's name and
/// looks it up by name, never a live reference — see `spec.md` §3's
/// "weak reference" ownership note.
#[derive(Debug, Clone)]
pub struct Backend {
    pub spec: ServerSpec,
    pub state: BackendState,
    pub protocol_version: Option<ProtocolVersion>,
    pub server_info: Option<ServerInfo>,
    pub capabilities: Option<ServerCapabilities>,
    pub last_activity: Instant,
    pub failure_streak: u32,
}

impl Backend {
    pub fn new(spec: ServerSpec) -> Self {
        Self {
            spec,
            state: BackendState::Disconnected,
            protocol_version: None,
            server_info: None,
            capabilities: None,
            last_activity: Instant::now(),
            failure_streak: 0,
        }
    }

    /// Reset the failure streak on any successful call or health probe.
    pub fn record_success(&mut self) {
        self.failure_streak = 0;
        self.last_activity = Instant::now();
    }

    /// Bump the failure streak on a failed call or probe; returns the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.failure_streak = self.failure_streak.saturating_add(1);
        self.failure_streak
    }

    pub fn supports(&self, kind: CapabilityKind) -> bool {
        let Some(caps) = &self.capabilities else { return false };
        match kind {
            CapabilityKind::Tool => caps.tools.is_some(),
            CapabilityKind::Prompt => caps.prompts.is_some(),
            CapabilityKind::Resource => caps.resources.is_some(),
            CapabilityKind::ResourceTemplate => caps.resources.is_some(),
        }
    }

    /// Record the negotiated handshake result (`spec.md` §4.3): the backend's
    /// declared protocol version, identity, and capability set. Called once,
    /// right after `initialize` returns and before the backend is marked
    /// Ready, so `supports()` reflects reality for the backend's whole
    /// Ready lifetime.
    pub fn apply_initialize(&mut self, response: &InitializeResponse) {
        self.protocol_version = Some(response.protocol_version.clone());
        self.server_info = Some(response.server_info.clone());
        self.capabilities = serde_json::from_value(response.capabilities.clone()).ok();
    }
}
