//! Goblin: an MCP gateway that multiplexes many backend MCP servers behind
//! one front-side MCP surface.

mod admin;
mod auth;
mod http;
mod reload;
mod signals;
mod state;

// Layer 1: Standard library imports
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Layer 2: Third-party crate imports
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// Layer 3: Internal module imports
use goblin_core::config::{self, AuthMode, ConfigDocument, ConfigError, ConfigWatcher};
use goblin_core::gateway::GatewayServer;
use goblin_core::pool::Pool;
use goblin_core::protocol::ServerInfo;
use goblin_core::reconcile::{ReconcileEvent, Reconciler};
use goblin_core::registry::Registry;
use goblin_core::router::Router;
use goblin_core::session::SessionManager;

use crate::state::AppState;

/// Exit codes per the front-side contract: 0 success, 1 generic, 2 invalid
/// arguments (handled by `clap` itself), 3 config error, 4 connection error,
/// 5 permission denied, 6 timeout, 7 not found, 8 validation error.
mod exit_code {
    pub const GENERIC: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 4;
    pub const PERMISSION_DENIED: i32 = 5;
    pub const NOT_FOUND: i32 = 7;
    pub const VALIDATION: i32 = 8;
}

#[derive(Parser, Debug)]
#[command(name = "goblin", about = "MCP gateway: multiplexes backend MCP servers behind one front-side surface")]
struct Cli {
    /// Path to the gateway config file (JSON). Defaults to `$GOBLIN_CONFIG`
    /// or `~/.goblin/config.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Force auth mode to `none` regardless of the config file.
    #[arg(long)]
    dev_mode: bool,
}

fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("GOBLIN_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".goblin")
        .join("config.json")
}

fn config_error_exit_code(err: &ConfigError) -> i32 {
    match err {
        ConfigError::Io { .. } | ConfigError::ParseError(_) => exit_code::CONFIG,
        ConfigError::Invalid(_)
        | ConfigError::TransportMismatch { .. }
        | ConfigError::DuplicateServerName(_)
        | ConfigError::DuplicateAlias(_) => exit_code::VALIDATION,
    }
}

fn load_config(cli: &Cli) -> Result<config::ConfigSnapshot, (i32, String)> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::NotFound {
            exit_code::NOT_FOUND
        } else if e.kind() == std::io::ErrorKind::PermissionDenied {
            exit_code::PERMISSION_DENIED
        } else {
            exit_code::CONFIG
        };
        (code, format!("failed to read config file {}: {e}", path.display()))
    })?;

    let mut doc: ConfigDocument = config::parse(&raw).map_err(|e| (config_error_exit_code(&e), e.to_string()))?;
    config::apply_env_overrides(&mut doc);

    if let Some(host) = &cli.host {
        doc.gateway.host = host.clone();
    }
    if let Some(port) = cli.port {
        doc.gateway.port = port;
    }
    if cli.dev_mode {
        doc.auth.mode = AuthMode::None;
    }

    config::validate(&doc).map_err(|e| (config_error_exit_code(&e), e.to_string()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("GOBLIN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let snapshot = match load_config(&cli) {
        Ok(snapshot) => snapshot,
        Err((code, message)) => {
            error!(error = %message, "failed to load config");
            std::process::exit(code);
        }
    };

    let pool = Arc::new(Pool::new());
    let registry = Registry::new();
    let router = Arc::new(Router::new(
        Arc::clone(&registry),
        Arc::clone(&pool),
        snapshot.policies.output_size_limit,
        Duration::from_millis(snapshot.policies.default_timeout),
    ));
    let sessions = SessionManager::new(
        snapshot.streamable_http.max_sessions,
        Duration::from_millis(snapshot.streamable_http.session_timeout_ms),
    );
    let server_info = ServerInfo { name: "goblin".to_string(), version: goblin_core::version().to_string() };
    let gateway = GatewayServer::new(Arc::clone(&sessions), Arc::clone(&registry), Arc::clone(&router), server_info);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&pool),
        Arc::clone(&registry),
        Arc::clone(&router),
        Arc::clone(&gateway),
    ));

    // Bootstrap: every enabled server in the freshly loaded snapshot is an
    // `Added` event, exactly as a live reload that introduces new servers
    // would produce. Reuses `Reconciler::drive`'s connect/sync/bridge-spawn
    // logic for startup instead of duplicating it.
    let bootstrap_events: Vec<ReconcileEvent> = snapshot
        .servers
        .values()
        .filter(|spec| spec.enabled)
        .cloned()
        .map(ReconcileEvent::Added)
        .collect();
    reconciler.drive(bootstrap_events, &snapshot).await;

    let host = snapshot.gateway.host.clone();
    let port = snapshot.gateway.port;
    let shared_snapshot = Arc::new(Mutex::new(snapshot));
    let (shutdown_tx, _) = broadcast::channel(1);

    let app_state = AppState {
        pool: Arc::clone(&pool),
        registry: Arc::clone(&registry),
        router: Arc::clone(&router),
        sessions: Arc::clone(&sessions),
        gateway: Arc::clone(&gateway),
        reconciler: Arc::clone(&reconciler),
        snapshot: Arc::clone(&shared_snapshot),
        started_at: std::time::Instant::now(),
        shutdown_tx: shutdown_tx.clone(),
    };

    spawn_idle_sweep(Arc::clone(&pool), Arc::clone(&sessions));
    spawn_health_sweep(Arc::clone(&pool), Arc::clone(&reconciler));

    if config_path.exists() {
        match ConfigWatcher::start(&config_path) {
            Ok(watcher) => {
                let watcher_shutdown = shutdown_tx.subscribe();
                let watcher_snapshot = Arc::clone(&shared_snapshot);
                let watcher_reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    watcher
                        .run(watcher_shutdown, move |outcome| {
                            reload::on_watcher_reload(outcome, Arc::clone(&watcher_snapshot), Arc::clone(&watcher_reconciler));
                        })
                        .await;
                });
            }
            Err(e) => warn!(error = %e, "failed to start config file watcher, hot-reload disabled"),
        }
    }

    signals::spawn_sighup(config_path, Arc::clone(&shared_snapshot), Arc::clone(&reconciler));

    let auth_config = app_state.current_snapshot().auth.clone();
    let auth_manager = Arc::new(auth::build_manager(auth_config.mode, auth_config.api_key.as_deref()));

    let router = admin::routes()
        .merge(http::routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn_with_state(auth_manager, auth::require_api_key));

    let addr = format!("{host}:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            let code = match e.kind() {
                std::io::ErrorKind::PermissionDenied => exit_code::PERMISSION_DENIED,
                std::io::ErrorKind::AddrInUse => exit_code::CONNECTION,
                _ => exit_code::GENERIC,
            };
            error!(addr = %addr, error = %e, "failed to bind listen address");
            std::process::exit(code);
        }
    };

    info!(addr = %addr, "goblin gateway listening");

    let shutdown_signal = shutdown_tx.clone();
    let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
        signals::wait_for_shutdown(shutdown_signal).await;
    });

    if let Err(e) = serve.await {
        error!(error = %e, "server exited with error");
        std::process::exit(exit_code::GENERIC);
    }
}

fn spawn_idle_sweep(pool: Arc<Pool>, sessions: Arc<SessionManager>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            pool.sweep_idle().await;
            sessions.sweep_idle().await;
        }
    });
}

/// Periodically retries any backend not currently `Ready` (crashed child,
/// dropped network connection, never-connected-at-startup). `Pool::acquire`
/// already encodes the single-flight/breaker/backoff rules; this task's only
/// job is to keep calling it so a crashed backend recovers without needing a
/// live client call to trigger the retry. `Disconnected` backends (an idle
/// `Stateless`/`Smart` backend between calls) are deliberately left alone —
/// those reconnect lazily on their next real call, not on a timer.
fn spawn_health_sweep(pool: Arc<Pool>, reconciler: Arc<Reconciler>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(goblin_core::pool::breaker::DEFAULT_PROBE_INTERVAL);
        loop {
            ticker.tick().await;
            for name in pool.names() {
                let needs_recovery = matches!(
                    pool.backend_snapshot(&name).await.map(|b| b.state),
                    Some(goblin_core::BackendState::Failed) | Some(goblin_core::BackendState::Degraded)
                );
                if needs_recovery {
                    reconciler.try_recover(&name).await;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["goblin", "--host", "0.0.0.0", "--port", "9000", "--dev-mode"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9000));
        assert!(cli.dev_mode);
    }

    #[test]
    fn cli_defaults_are_none() {
        let cli = Cli::try_parse_from(["goblin"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(!cli.dev_mode);
    }

    #[test]
    fn load_config_overrides_host_port_and_dev_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "servers": [],
                "gateway": { "host": "127.0.0.1", "port": 8080 },
                "auth": { "mode": "apikey", "api_key": "secret" },
                "policies": { "output_size_limit": 65536, "default_timeout": 30000 }
            }"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            host: Some("0.0.0.0".to_string()),
            port: Some(9100),
            dev_mode: true,
        };

        let snapshot = load_config(&cli).unwrap();
        assert_eq!(snapshot.gateway.host, "0.0.0.0");
        assert_eq!(snapshot.gateway.port, 9100);
        assert_eq!(snapshot.auth.mode, AuthMode::None);
    }

    #[test]
    fn load_config_missing_file_is_not_found() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/goblin/config.json")),
            host: None,
            port: None,
            dev_mode: false,
        };
        let (code, _) = load_config(&cli).unwrap_err();
        assert_eq!(code, exit_code::NOT_FOUND);
    }

    #[test]
    fn config_error_exit_codes_match_spec() {
        assert_eq!(
            config_error_exit_code(&ConfigError::ParseError("bad json".to_string())),
            exit_code::CONFIG
        );
        assert_eq!(
            config_error_exit_code(&ConfigError::Invalid("bad shape".to_string())),
            exit_code::VALIDATION
        );
        assert_eq!(
            config_error_exit_code(&ConfigError::DuplicateServerName("dup".to_string())),
            exit_code::VALIDATION
        );
    }
}
