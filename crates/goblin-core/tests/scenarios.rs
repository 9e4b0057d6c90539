//! End-to-end scenario tests driving real `sh`-scripted stdio backends
//! through the pool/registry/router/reconciler/gateway stack together,
//! rather than unit-testing each component against mocks. Each backend is a
//! small POSIX shell script speaking the same `Content-Length`-framed
//! JSON-RPC `goblin_core::transport::stdio::StdioTransport` drives a real
//! child process over, modelled on the subprocess-mock pattern used
//! elsewhere in the ecosystem for MCP-over-stdio testing.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use goblin_core::config::{parse, validate, ConfigSnapshot};
use goblin_core::gateway::GatewayServer;
use goblin_core::protocol::{
    methods, JsonRpcRequest, RequestId, ServerInfo,
};
use goblin_core::reconcile::{diff, ReconcileEvent};
use goblin_core::registry::{Registry, RegistryEvent};
use goblin_core::router::{CallContext, Router, RouterError};
use goblin_core::session::SessionManager;
use goblin_core::{BackendState, Pool, Reconciler};

/// Writes a POSIX-sh fake MCP backend to `dir` and returns its path.
///
/// `tools` becomes the `tools/list` result; when `sleep_tool` is `Some`, a
/// `tools/call` naming that tool sleeps `sleep_secs` before replying, so
/// tests can exercise the router's deadline enforcement against a real
/// slow backend rather than a simulated one. The script writes its own pid
/// to `pidfile` on startup so a test can kill the exact child process the
/// pool is holding, to exercise crash recovery against an actual process
/// death rather than a feigned one.
fn write_fake_backend(
    dir: &Path,
    pidfile: &Path,
    tools: &[&str],
    sleep_tool: Option<&str>,
    sleep_secs: u64,
) -> PathBuf {
    let tools_json: String = tools
        .iter()
        .map(|t| {
            format!(
                r#"{{"name":"{t}","description":"fake tool {t}","inputSchema":{{"type":"object","properties":{{}}}}}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    let script = format!(
        r##"#!/bin/sh
echo $$ > "{pidfile}"

SLEEP_TOOL="{sleep_tool}"
SLEEP_SECS="{sleep_secs}"

read_frame() {{
  content_length=""
  while IFS= read -r line; do
    line=$(printf '%s' "$line" | tr -d '\r')
    if [ -z "$line" ]; then
      break
    fi
    case "$line" in
      Content-Length:*) content_length=$(printf '%s' "$line" | sed 's/Content-Length:[ ]*//') ;;
    esac
  done
  [ -z "$content_length" ] && return 1
  dd bs=1 count="$content_length" 2>/dev/null
}}

send_frame() {{
  body="$1"
  len=$(printf '%s' "$body" | wc -c)
  printf 'Content-Length: %s\r\n\r\n%s' "$len" "$body"
}}

while body=$(read_frame); do
  [ -z "$body" ] && continue
  id=$(printf '%s' "$body" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$body" in
    *'"method":"initialize"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"protocolVersion\":\"2024-11-05\",\"capabilities\":{{\"experimental\":null,\"logging\":null,\"prompts\":{{\"list_changed\":false}},\"resources\":{{\"subscribe\":false,\"list_changed\":false}},\"tools\":{{\"list_changed\":false}}}},\"serverInfo\":{{\"name\":\"fake-backend\",\"version\":\"0.0.0\"}}}}}}"
      ;;
    *'"method":"tools/list"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"tools\":[{tools_json}]}}}}"
      ;;
    *'"method":"prompts/list"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"prompts\":[]}}}}"
      ;;
    *'"method":"resources/list"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"resources\":[]}}}}"
      ;;
    *'"method":"resources/templates/list"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"resource_templates\":[]}}}}"
      ;;
    *'"method":"ping"'*)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{}}}}"
      ;;
    *'"method":"tools/call"'*)
      name=$(printf '%s' "$body" | sed -n 's/.*"name":"\([^"]*\)".*/\1/p')
      if [ -n "$SLEEP_TOOL" ] && [ "$name" = "$SLEEP_TOOL" ]; then
        sleep "$SLEEP_SECS"
      fi
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{\"content\":[{{\"type\":\"text\",\"text\":\"ok:$name\"}}],\"is_error\":false}}}}"
      ;;
    *)
      send_frame "{{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{{}}}}"
      ;;
  esac
done
"##,
        pidfile = pidfile.display(),
        sleep_tool = sleep_tool.unwrap_or(""),
        sleep_secs = sleep_secs,
        tools_json = tools_json,
    );

    let script_path = dir.join(format!("fake-backend-{}.sh", tools.join("-")));
    fs::write(&script_path, script).expect("write fake backend script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
    }

    script_path
}

/// One backend entry for [`config_json`]: a name, its fake script path, and
/// the pidfile the harness will poll to find its child's pid.
struct BackendDecl {
    name: &'static str,
    script: PathBuf,
}

fn config_json(backends: &[BackendDecl], default_timeout_ms: u64) -> String {
    let servers: String = backends
        .iter()
        .map(|b| {
            format!(
                r#"{{"name":"{name}","transport":"stdio","command":"sh","args":["{script}"]}}"#,
                name = b.name,
                script = b.script.display(),
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"{{
            "servers": [{servers}],
            "gateway": {{"host": "127.0.0.1", "port": 0}},
            "auth": {{"mode": "none"}},
            "policies": {{"default_timeout": {timeout}}}
        }}"#,
        servers = servers,
        timeout = default_timeout_ms,
    )
}

fn snapshot_from(raw: &str) -> ConfigSnapshot {
    validate(&parse(raw).expect("parse config")).expect("validate config")
}

/// Everything a scenario test needs, wired exactly as `goblin/src/main.rs`
/// wires its own components (pool -> registry -> router -> sessions ->
/// gateway -> reconciler), so these tests exercise the real assembly rather
/// than a parallel hand-rolled one.
struct Harness {
    pool: Arc<Pool>,
    registry: Arc<Registry>,
    router: Arc<Router>,
    reconciler: Arc<Reconciler>,
    #[allow(dead_code)]
    gateway: Arc<GatewayServer>,
}

impl Harness {
    async fn bootstrap(snapshot: &ConfigSnapshot) -> Self {
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
        let server_info = ServerInfo { name: "goblin-test".to_string(), version: "0.0.0".to_string() };
        let gateway = GatewayServer::new(Arc::clone(&sessions), Arc::clone(&registry), Arc::clone(&router), server_info);
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&pool),
            Arc::clone(&registry),
            Arc::clone(&router),
            Arc::clone(&gateway),
        ));

        let bootstrap_events: Vec<ReconcileEvent> = snapshot
            .servers
            .values()
            .filter(|spec| spec.enabled)
            .cloned()
            .map(ReconcileEvent::Added)
            .collect();
        reconciler.drive(bootstrap_events, snapshot).await;

        Self { pool, registry, router, reconciler, gateway }
    }

    fn call_ctx(&self, deadline: Duration) -> CallContext {
        CallContext { request_id: RequestId::new_number(1), session_id: uuid::Uuid::new_v4(), deadline }
    }
}

fn tool_names(tools: &[goblin_core::CapabilityCard]) -> Vec<String> {
    let mut names: Vec<String> = tools.iter().map(|c| c.qualified_name.clone()).collect();
    names.sort();
    names
}

async fn wait_for_pidfile(pidfile: &Path) -> u32 {
    for _ in 0..100 {
        if let Ok(content) = fs::read_to_string(pidfile) {
            if let Ok(pid) = content.trim().parse::<u32>() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("backend never wrote its pidfile at {}", pidfile.display());
}

/// Scenario 1: two backends with overlapping tool names aggregate into one
/// flat, server-qualified union with no collisions.
#[tokio::test]
async fn aggregation_yields_qualified_union_of_backend_tools() {
    let dir = tempfile::tempdir().unwrap();
    let s1_pidfile = dir.path().join("s1.pid");
    let s2_pidfile = dir.path().join("s2.pid");
    let s1_script = write_fake_backend(dir.path(), &s1_pidfile, &["a", "b"], None, 0);
    let s2_script = write_fake_backend(dir.path(), &s2_pidfile, &["b", "c"], None, 0);

    let raw = config_json(
        &[
            BackendDecl { name: "s1", script: s1_script },
            BackendDecl { name: "s2", script: s2_script },
        ],
        5_000,
    );
    let snapshot = snapshot_from(&raw);
    let harness = Harness::bootstrap(&snapshot).await;

    let view = harness.registry.snapshot().await;
    assert_eq!(
        tool_names(&view.tools),
        vec!["s1_a", "s1_b", "s2_b", "s2_c"],
        "qualified names must disambiguate the shared local name \"b\""
    );
}

/// Scenario 2: adding a server to a live config produces a `ToolsChanged`
/// event promptly and the union reflects the new backend's tools.
#[tokio::test]
async fn hot_add_emits_list_changed_and_extends_the_union() {
    let dir = tempfile::tempdir().unwrap();
    let s1_pidfile = dir.path().join("s1.pid");
    let s1_script = write_fake_backend(dir.path(), &s1_pidfile, &["a"], None, 0);

    let old_raw = config_json(&[BackendDecl { name: "s1", script: s1_script.clone() }], 5_000);
    let old_snapshot = snapshot_from(&old_raw);
    let harness = Harness::bootstrap(&old_snapshot).await;

    let mut events_rx = harness.registry.subscribe();

    let s2_pidfile = dir.path().join("s2.pid");
    let s2_script = write_fake_backend(dir.path(), &s2_pidfile, &["x"], None, 0);
    let new_raw = config_json(
        &[
            BackendDecl { name: "s1", script: s1_script },
            BackendDecl { name: "s2", script: s2_script },
        ],
        5_000,
    );
    let new_snapshot = snapshot_from(&new_raw);

    let events = diff(&old_snapshot, &new_snapshot);
    assert_eq!(events.len(), 1, "only the newly added server should produce an event");
    assert!(matches!(&events[0], ReconcileEvent::Added(spec) if spec.name == "s2"));

    harness.reconciler.drive(events, &new_snapshot).await;

    let saw_tools_changed = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match events_rx.recv().await {
                Ok(RegistryEvent::ToolsChanged) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await
    .unwrap_or(false);
    assert!(saw_tools_changed, "hot add must surface a tools-changed event within 1s");

    let view = harness.registry.snapshot().await;
    assert_eq!(tool_names(&view.tools), vec!["s1_a", "s2_x"]);
}

/// Scenario 3: a config reload that fails to parse must never touch the
/// live registry — the previous union stays exactly as it was.
#[tokio::test]
async fn invalid_reload_leaves_previous_union_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let s1_pidfile = dir.path().join("s1.pid");
    let s1_script = write_fake_backend(dir.path(), &s1_pidfile, &["a"], None, 0);

    let raw = config_json(&[BackendDecl { name: "s1", script: s1_script }], 5_000);
    let snapshot = snapshot_from(&raw);
    let harness = Harness::bootstrap(&snapshot).await;

    let before = tool_names(&harness.registry.snapshot().await.tools);

    let broken = "{ this is not valid json";
    assert!(parse(broken).is_err(), "malformed config must fail to parse");

    let after = tool_names(&harness.registry.snapshot().await.tools);
    assert_eq!(before, after, "a reload that never parses must never reach the reconciler");
}

/// Scenario 4: a backend that hangs past `defaultTimeout` on `tools/call`
/// surfaces a timeout quickly and without degrading the backend — a
/// slow reply is not a crash.
#[tokio::test]
async fn slow_tool_call_times_out_without_degrading_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let pidfile = dir.path().join("slow.pid");
    let script = write_fake_backend(dir.path(), &pidfile, &["slow"], Some("slow"), 10);

    let raw = config_json(&[BackendDecl { name: "s1", script }], 500);
    let snapshot = snapshot_from(&raw);
    let harness = Harness::bootstrap(&snapshot).await;

    let ctx = harness.call_ctx(Duration::from_millis(500));
    let started = std::time::Instant::now();
    let result = harness.router.call_tool(&ctx, "s1_slow", serde_json::json!({})).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(RouterError::Timeout { .. })), "got {result:?}");
    assert!(elapsed < Duration::from_secs(1), "timeout must fire around the 500ms deadline, took {elapsed:?}");

    let backend = harness.pool.backend_snapshot("s1").await.unwrap();
    assert_eq!(backend.state, BackendState::Ready, "a slow reply must not be treated as a crash");
}

/// Scenario 5: resuming a session by id after its transport disconnects
/// (without an explicit `close_session`) keeps it usable, and a session
/// that was actually closed cannot be resumed.
#[tokio::test]
async fn session_resume_keeps_state_after_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let pidfile = dir.path().join("s1.pid");
    let script = write_fake_backend(dir.path(), &pidfile, &["a"], None, 0);
    let raw = config_json(&[BackendDecl { name: "s1", script }], 5_000);
    let snapshot = snapshot_from(&raw);
    let harness = Harness::bootstrap(&snapshot).await;

    let handle = harness.gateway.open_session("streamable-http", false).await.unwrap();
    let id = handle.session.lock().await.id;

    let init = JsonRpcRequest::new(
        methods::INITIALIZE,
        Some(serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "0.0.0"},
        })),
        RequestId::new_number(1),
    );
    let response = harness.gateway.handle_request(&handle, init).await;
    assert!(response.error.is_none(), "initialize must succeed: {response:?}");

    // Simulate the transport dropping without an explicit shutdown: the
    // session stays indexed, just idle.
    let resumed = harness.gateway.resume_session(id, "streamable-http", false).await.unwrap();
    assert_eq!(resumed.session.lock().await.id, id);

    let ping = JsonRpcRequest::new(methods::PING, None, RequestId::new_number(2));
    let ping_response = harness.gateway.handle_request(&resumed, ping).await;
    assert!(ping_response.error.is_none(), "resumed session must still accept calls: {ping_response:?}");

    harness.gateway.close_session(&id).await;
    let resume_after_close = harness.gateway.resume_session(id, "streamable-http", false).await;
    assert!(resume_after_close.is_err(), "a closed session must not be resumable");
}

/// Scenario 6: one backend's child process crashes mid-session. Its own
/// calls fail and it degrades, the health sweep's job (`Reconciler::try_recover`)
/// brings it back, and the crash never disturbs a second, healthy backend.
#[tokio::test]
async fn crash_isolation_recovers_one_backend_without_disturbing_another() {
    let dir = tempfile::tempdir().unwrap();
    let s1_pidfile = dir.path().join("s1.pid");
    let s2_pidfile = dir.path().join("s2.pid");
    let s1_script = write_fake_backend(dir.path(), &s1_pidfile, &["flaky"], None, 0);
    let s2_script = write_fake_backend(dir.path(), &s2_pidfile, &["steady"], None, 0);

    let raw = config_json(
        &[
            BackendDecl { name: "s1", script: s1_script },
            BackendDecl { name: "s2", script: s2_script },
        ],
        5_000,
    );
    let snapshot = snapshot_from(&raw);
    let harness = Harness::bootstrap(&snapshot).await;

    let pid = wait_for_pidfile(&s1_pidfile).await;

    let ctx = harness.call_ctx(Duration::from_millis(2_000));
    let before = harness.router.call_tool(&ctx, "s1_flaky", serde_json::json!({})).await;
    assert!(before.is_ok(), "backend must be callable before the crash: {before:?}");

    let status = Command::new("kill").args(["-9", &pid.to_string()]).status().expect("run kill");
    assert!(status.success(), "failed to kill fake backend s1 (pid {pid})");

    // Give the actor task time to observe the dead child's EOF.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let failed = harness.router.call_tool(&ctx, "s1_flaky", serde_json::json!({})).await;
    assert!(matches!(failed, Err(RouterError::BackendUnavailable(_))), "got {failed:?}");

    let degraded = harness.pool.backend_snapshot("s1").await.unwrap();
    assert_ne!(degraded.state, BackendState::Ready, "a dead backend must leave Ready once a call observes it");

    // s2 must still be fully usable throughout, crash isolation's whole point.
    let steady = harness.router.call_tool(&ctx, "s2_steady", serde_json::json!({})).await;
    assert!(steady.is_ok(), "an unrelated backend must stay callable during s1's crash: {steady:?}");

    // Simulate the binary crate's periodic health sweep recovering it.
    harness.reconciler.try_recover("s1").await;
    let recovered = harness.pool.backend_snapshot("s1").await.unwrap();
    assert_eq!(recovered.state, BackendState::Ready, "try_recover must bring the backend back to Ready");

    let after_recovery = harness.router.call_tool(&ctx, "s1_flaky", serde_json::json!({})).await;
    assert!(after_recovery.is_ok(), "s1 must be callable again after recovery: {after_recovery:?}");
}
