//! Shared reload path for the file watcher and SIGHUP, per `spec.md` §4.1:
//! both must exercise identical parse/diff/drive logic.

// Layer 1: Standard library imports
use std::path::Path;
use std::sync::{Arc, Mutex};

// Layer 2: Third-party crate imports
use tracing::{info, warn};

// Layer 3: Internal module imports
use goblin_core::config::{reload_from_str, ConfigSnapshot, ReloadOutcome};
use goblin_core::reconcile::Reconciler;

/// Diff `new` against the currently live snapshot, swap it in, and drive the
/// reconciler. Runs the (async) drive step on a spawned task so the caller
/// (a synchronous watcher callback, or the SIGHUP task) never blocks on it.
fn apply_new_snapshot(new: ConfigSnapshot, shared: &Arc<Mutex<ConfigSnapshot>>, reconciler: &Arc<Reconciler>) {
    let old = shared
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();

    if old == new {
        info!("config reload: content unchanged, no reconcile events");
        return;
    }

    let events = Reconciler::apply(&old, &new);
    *shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = new.clone();

    let reconciler = Arc::clone(reconciler);
    tokio::spawn(async move {
        reconciler.drive(events, &new).await;
        info!("config reload applied");
    });
}

/// Callback passed to `ConfigWatcher::run`. Intentionally synchronous; the
/// side-effecting reconcile step is handed off to a spawned task.
pub fn on_watcher_reload(
    outcome: ReloadOutcome,
    shared: Arc<Mutex<ConfigSnapshot>>,
    reconciler: Arc<Reconciler>,
) {
    match outcome {
        ReloadOutcome::Applied(new) => apply_new_snapshot(new, &shared, &reconciler),
        ReloadOutcome::Rejected(err) => {
            warn!(error = %err, "config reload rejected by file watcher, keeping current snapshot");
        }
    }
}

/// SIGHUP entry point: read and reload the config file directly, using the
/// exact same `reload_from_str` pipeline the file watcher uses.
pub async fn reload_from_path(path: &Path, shared: Arc<Mutex<ConfigSnapshot>>, reconciler: Arc<Reconciler>) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "SIGHUP reload: failed to read config file");
            return;
        }
    };
    match reload_from_str(&raw) {
        Ok(new) => apply_new_snapshot(new, &shared, &reconciler),
        Err(e) => warn!(path = %path.display(), error = %e, "SIGHUP reload rejected, keeping current snapshot"),
    }
}
