//! Config parsing, environment overlay, and validation
//!
//! Validation is a pure function `&ConfigDocument -> Result<ConfigSnapshot,
//! ConfigError>` so it is unit-testable without touching the filesystem or a
//! live reconciler.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

// Layer 3: Internal module imports
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::model::{AuthMode, ConfigDocument, TransportKind};
use crate::config::snapshot::{Alias, ConfigSnapshot, ServerSpec, TransportPayload};

/// Parse a config document from its raw JSON text.
pub fn parse(raw: &str) -> ConfigResult<ConfigDocument> {
    serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Apply environment-variable overrides to a parsed document.
///
/// Per `spec.md` §4.1, overrides are applied after parse and before
/// validation: `GOBLIN_HOST`, `GOBLIN_PORT`, `GOBLIN_AUTH_MODE`,
/// `GOBLIN_API_KEY`.
pub fn apply_env_overrides(doc: &mut ConfigDocument) {
    if let Ok(host) = env::var("GOBLIN_HOST") {
        doc.gateway.host = host;
    }
    if let Ok(port) = env::var("GOBLIN_PORT") {
        if let Ok(port) = port.parse() {
            doc.gateway.port = port;
        }
    }
    if let Ok(mode) = env::var("GOBLIN_AUTH_MODE") {
        doc.auth.mode = match mode.as_str() {
            "none" => AuthMode::None,
            _ => AuthMode::Apikey,
        };
    }
    if let Ok(key) = env::var("GOBLIN_API_KEY") {
        doc.auth.api_key = Some(key);
    }
}

/// Validate a parsed (and overridden) document, producing an immutable
/// snapshot, or a descriptive `ConfigError` leaving the caller free to keep
/// its previous snapshot.
pub fn validate(doc: &ConfigDocument) -> ConfigResult<ConfigSnapshot> {
    let mut servers = HashMap::with_capacity(doc.servers.len());

    for raw in &doc.servers {
        if servers.contains_key(&raw.name) {
            return Err(ConfigError::DuplicateServerName(raw.name.clone()));
        }

        let payload = match raw.transport {
            TransportKind::Stdio => {
                let command = raw.command.clone().ok_or_else(|| ConfigError::TransportMismatch {
                    name: raw.name.clone(),
                    kind: "stdio".to_string(),
                })?;
                TransportPayload::Stdio {
                    command,
                    args: raw.args.clone().unwrap_or_default(),
                    env: raw.env.clone().unwrap_or_default(),
                }
            }
            TransportKind::Http | TransportKind::Sse | TransportKind::StreamableHttp => {
                let url = raw.url.clone().ok_or_else(|| ConfigError::TransportMismatch {
                    name: raw.name.clone(),
                    kind: raw.transport.to_string(),
                })?;
                TransportPayload::Network {
                    url,
                    headers: raw.headers.clone().unwrap_or_default(),
                }
            }
        };

        servers.insert(
            raw.name.clone(),
            ServerSpec {
                name: raw.name.clone(),
                transport: raw.transport,
                enabled: raw.enabled,
                mode: raw.mode,
                payload,
                description: raw.description.clone(),
                idle_timeout_ms: raw.idle_timeout_ms,
            },
        );
    }

    let mut aliases = HashMap::with_capacity(doc.aliases.len());
    let mut seen_targets: HashMap<(String, String), String> = HashMap::new();
    for raw in &doc.aliases {
        if aliases.contains_key(&raw.alias) {
            return Err(ConfigError::DuplicateAlias(raw.alias.clone()));
        }
        let target = (raw.server_name.clone(), raw.local_name.clone());
        if let Some(existing_alias) = seen_targets.get(&target) {
            return Err(ConfigError::DuplicateAlias(format!(
                "{} and {} both map to {}_{}",
                existing_alias, raw.alias, raw.server_name, raw.local_name
            )));
        }
        seen_targets.insert(target, raw.alias.clone());
        aliases.insert(
            raw.alias.clone(),
            Alias {
                alias: raw.alias.clone(),
                server_name: raw.server_name.clone(),
                local_name: raw.local_name.clone(),
            },
        );
    }

    if doc.gateway.host.is_empty() {
        return Err(ConfigError::Invalid("gateway.host must not be empty".to_string()));
    }

    if matches!(doc.auth.mode, AuthMode::Apikey) && doc.auth.api_key.is_none() {
        return Err(ConfigError::Invalid(
            "auth.mode is \"apikey\" but no auth.apiKey was provided".to_string(),
        ));
    }

    Ok(ConfigSnapshot {
        generation: ConfigSnapshot::next_generation(),
        servers: Arc::new(servers),
        gateway: doc.gateway.clone(),
        auth: doc.auth.clone(),
        policies: doc.policies.clone(),
        virtual_tools: Arc::new(doc.virtual_tools.clone()),
        streamable_http: doc.streamable_http.clone().unwrap_or_default(),
        aliases: Arc::new(aliases),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_doc() -> ConfigDocument {
        parse(
            r#"{
                "servers": [],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn validates_minimal_document() {
        let doc = minimal_doc();
        let snapshot = validate(&doc).unwrap();
        assert_eq!(snapshot.servers.len(), 0);
        assert_eq!(snapshot.policies.output_size_limit, 64 * 1024);
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{
            "servers": [],
            "gateway": {"host": "127.0.0.1", "port": 8080},
            "auth": {"mode": "none"},
            "policies": {},
            "bogus": true
        }"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn rejects_stdio_spec_missing_command() {
        let mut doc = minimal_doc();
        doc.servers.push(crate::config::model::ServerSpecDoc {
            name: "s1".to_string(),
            transport: TransportKind::Stdio,
            enabled: true,
            mode: Default::default(),
            description: None,
            idle_timeout_ms: None,
            command: None,
            args: None,
            env: None,
            url: None,
            headers: None,
        });
        assert!(matches!(
            validate(&doc),
            Err(ConfigError::TransportMismatch { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_aliases_to_same_target() {
        let mut doc = minimal_doc();
        doc.aliases.push(crate::config::model::AliasSpec {
            alias: "a1".to_string(),
            server_name: "s1".to_string(),
            local_name: "tool".to_string(),
        });
        doc.aliases.push(crate::config::model::AliasSpec {
            alias: "a2".to_string(),
            server_name: "s1".to_string(),
            local_name: "tool".to_string(),
        });
        assert!(matches!(validate(&doc), Err(ConfigError::DuplicateAlias(_))));
    }

    #[test]
    fn env_overrides_apply_before_validation() {
        let mut doc = minimal_doc();
        std::env::set_var("GOBLIN_HOST", "0.0.0.0");
        std::env::set_var("GOBLIN_PORT", "9999");
        apply_env_overrides(&mut doc);
        std::env::remove_var("GOBLIN_HOST");
        std::env::remove_var("GOBLIN_PORT");
        assert_eq!(doc.gateway.host, "0.0.0.0");
        assert_eq!(doc.gateway.port, 9999);
    }

    #[test]
    fn identical_documents_produce_content_equal_snapshots() {
        let doc = minimal_doc();
        let a = validate(&doc).unwrap();
        let b = validate(&doc).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.generation, b.generation);
    }
}
