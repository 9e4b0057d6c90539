//! Configuration model, validation, and hot-reload watcher
//!
//! See `config::model` for the on-disk JSON shape, `config::validate` for the
//! pure parse/overlay/validate pipeline, `config::snapshot` for the
//! validated immutable view the rest of the gateway consumes, and
//! `config::watcher` for the filesystem-driven reload loop.

pub mod error;
pub mod model;
pub mod snapshot;
pub mod validate;
pub mod watcher;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    AliasSpec, AuthConfig, AuthMode, ConfigDocument, GatewayConfig, PoliciesConfig, ServerMode,
    ServerSpecDoc, StreamableHttpConfig, TransportKind, VirtualToolSpec,
};
pub use snapshot::{Alias, ConfigSnapshot, ServerSpec, TransportPayload};
pub use validate::{apply_env_overrides, parse, validate};
pub use watcher::{reload_from_str, ConfigWatcher, ReloadOutcome, DEBOUNCE};
