//! Configuration errors

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised while loading, overlaying, or validating a config document.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The document could not be parsed as JSON.
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// The document failed schema validation.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A server spec's transport payload didn't match its declared `transport` kind.
    #[error("server {name}: transport payload does not match kind {kind}")]
    TransportMismatch { name: String, kind: String },

    /// Two server specs declared the same name.
    #[error("duplicate server name: {0}")]
    DuplicateServerName(String),

    /// Two aliases resolved to the same `{serverName, localName}` pair, or the
    /// same alias name was declared twice.
    #[error("duplicate alias: {0}")]
    DuplicateAlias(String),

    /// Reading the config file from disk failed.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::sync::Arc<std::io::Error>,
    },
}

/// Convenience result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
