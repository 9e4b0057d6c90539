//! POSIX signal handling: SIGHUP reloads, SIGINT/SIGTERM shut down.

// Layer 1: Standard library imports
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// Layer 2: Third-party crate imports
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::info;

// Layer 3: Internal module imports
use crate::reload;
use goblin_core::config::ConfigSnapshot;
use goblin_core::reconcile::Reconciler;

/// Spawn the SIGHUP reload task. Runs until the process exits; there is
/// nothing to join on since reload failures only warn and keep serving.
pub fn spawn_sighup(config_path: PathBuf, snapshot: Arc<Mutex<ConfigSnapshot>>, reconciler: Arc<Reconciler>) {
    tokio::spawn(async move {
        let Ok(mut hangup) = signal(SignalKind::hangup()) else {
            return;
        };
        loop {
            hangup.recv().await;
            info!(path = %config_path.display(), "SIGHUP received, reloading config");
            reload::reload_from_path(&config_path, Arc::clone(&snapshot), Arc::clone(&reconciler)).await;
        }
    });
}

/// Wait for SIGINT or SIGTERM and broadcast shutdown. Returns once a signal
/// arrives or `shutdown_tx`'s queue is otherwise triggered (the admin
/// plane's `/shutdown` endpoint sends on the same channel).
pub async fn wait_for_shutdown(shutdown_tx: broadcast::Sender<()>) {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
                _ = sigint.recv() => info!("SIGINT received, shutting down"),
                _ = shutdown_rx.recv() => info!("shutdown requested via admin endpoint"),
            }
        }
        _ => {
            // No OS signal handling available; fall back to the admin endpoint only.
            let _ = shutdown_rx.recv().await;
        }
    }

    let _ = shutdown_tx.send(());
}
