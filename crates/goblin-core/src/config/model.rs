//! Config document serde model
//!
//! `ConfigDocument` is the literal JSON shape described in `spec.md` §6. It
//! derives `Deserialize` with `deny_unknown_fields` so unrecognized keys are
//! rejected at parse time rather than silently ignored.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

/// Top-level config document, matching the on-disk JSON shape exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    pub servers: Vec<ServerSpecDoc>,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub policies: PoliciesConfig,
    #[serde(default)]
    pub virtual_tools: Vec<VirtualToolSpec>,
    #[serde(default)]
    pub streamable_http: Option<StreamableHttpConfig>,
    #[serde(default)]
    pub aliases: Vec<AliasSpec>,
}

/// Transport kind a server spec declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Http,
    Sse,
    #[serde(rename = "streamablehttp")]
    StreamableHttp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
            TransportKind::Sse => "sse",
            TransportKind::StreamableHttp => "streamablehttp",
        };
        write!(f, "{s}")
    }
}

/// Pool lifecycle policy for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    #[default]
    Stateful,
    Stateless,
    Smart,
}

/// On-disk representation of a `ServerSpec`. Transport-specific fields are
/// all optional here; `validate` checks that the right subset is present for
/// the declared `transport` kind and produces the strongly-typed
/// `ServerSpec` (see [`crate::config::snapshot`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSpecDoc {
    pub name: String,
    pub transport: TransportKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: ServerMode,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,

    // stdio-only
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,

    // network-only
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

fn default_true() -> bool {
    true
}

/// Front-side listen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Auth mode: a static shared secret, or an explicit dev-mode bypass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Apikey,
    None,
}

/// Router/output policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoliciesConfig {
    #[serde(default = "default_output_size_limit")]
    pub output_size_limit: usize,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout: u64,
    /// Fallback for a session's compatibility mode when `initialize` carries
    /// no client hint.
    #[serde(default = "default_compatibility_mode_default")]
    pub compatibility_mode_default: bool,
}

fn default_output_size_limit() -> usize {
    64 * 1024
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_compatibility_mode_default() -> bool {
    false
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            output_size_limit: default_output_size_limit(),
            default_timeout: default_timeout_ms(),
            compatibility_mode_default: default_compatibility_mode_default(),
        }
    }
}

/// Streamable-HTTP session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamableHttpConfig {
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default)]
    pub sse_enabled: bool,
}

fn default_session_timeout_ms() -> u64 {
    5 * 60 * 1000
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for StreamableHttpConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: default_session_timeout_ms(),
            max_sessions: default_max_sessions(),
            sse_enabled: false,
        }
    }
}

/// A declared virtual tool: config surface only, no scripting engine behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Maps an external alias name to a concrete `{serverName, localName}` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasSpec {
    pub alias: String,
    pub server_name: String,
    pub local_name: String,
}
