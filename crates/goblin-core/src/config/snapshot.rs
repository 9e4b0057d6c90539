//! Validated, immutable configuration snapshot
//!
//! `ConfigSnapshot` is what the rest of the gateway actually consumes — it is
//! only ever produced by [`crate::config::validate::validate`], never
//! constructed directly from untrusted input.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Layer 3: Internal module imports
use crate::config::model::{
    AuthConfig, GatewayConfig, PoliciesConfig, ServerMode, StreamableHttpConfig, TransportKind,
    VirtualToolSpec,
};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Transport-specific payload for a validated server spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPayload {
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    Network {
        url: String,
        headers: HashMap<String, String>,
    },
}

/// A validated, strongly-typed server configuration record (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSpec {
    pub name: String,
    pub transport: TransportKind,
    pub enabled: bool,
    pub mode: ServerMode,
    pub payload: TransportPayload,
    pub description: Option<String>,
    pub idle_timeout_ms: Option<u64>,
}

/// A validated alias entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub alias: String,
    pub server_name: String,
    pub local_name: String,
}

/// A validated, immutable view of the whole configuration. Produced only by
/// `validate`; the reconciler diffs two of these by content, never by
/// `generation` (which exists purely for log/debug correlation).
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub generation: u64,
    pub servers: Arc<HashMap<String, ServerSpec>>,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub policies: PoliciesConfig,
    pub virtual_tools: Arc<Vec<VirtualToolSpec>>,
    pub streamable_http: StreamableHttpConfig,
    pub aliases: Arc<HashMap<String, Alias>>,
}

impl ConfigSnapshot {
    pub(crate) fn next_generation() -> u64 {
        NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
    }

    pub fn server(&self, name: &str) -> Option<&ServerSpec> {
        self.servers.get(name)
    }
}

impl PartialEq for ConfigSnapshot {
    fn eq(&self, other: &Self) -> bool {
        // Content equality, deliberately ignoring `generation`: the
        // reconciler must treat two snapshots with identical content as
        // unchanged regardless of how many times the file was re-saved.
        *self.servers == *other.servers
            && self.gateway.host == other.gateway.host
            && self.gateway.port == other.gateway.port
            && self.auth.mode == other.auth.mode
            && self.auth.api_key == other.auth.api_key
            && self.policies.output_size_limit == other.policies.output_size_limit
            && self.policies.default_timeout == other.policies.default_timeout
            && self.policies.compatibility_mode_default == other.policies.compatibility_mode_default
            && *self.virtual_tools == *other.virtual_tools
            && self.streamable_http.session_timeout_ms == other.streamable_http.session_timeout_ms
            && self.streamable_http.max_sessions == other.streamable_http.max_sessions
            && self.streamable_http.sse_enabled == other.streamable_http.sse_enabled
            && *self.aliases == *other.aliases
    }
}

impl PartialEq for GatewayConfig {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl PartialEq for VirtualToolSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.description == other.description
    }
}
