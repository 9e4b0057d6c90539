//! Shared application state handed to every axum handler

// Layer 1: Standard library imports
use std::sync::{Arc, Mutex};
use std::time::Instant;

// Layer 2: Third-party crate imports
use tokio::sync::broadcast;

// Layer 3: Internal module imports
use goblin_core::config::ConfigSnapshot;
use goblin_core::gateway::GatewayServer;
use goblin_core::pool::Pool;
use goblin_core::reconcile::Reconciler;
use goblin_core::registry::Registry;
use goblin_core::router::Router;
use goblin_core::session::SessionManager;

/// Everything the admin plane and the streamable-HTTP front door need.
/// `snapshot` is a `std::sync::Mutex` rather than `tokio::sync::RwLock`
/// because the `ConfigWatcher` callback (`config::watcher::ConfigWatcher::run`)
/// is a plain synchronous closure; diffing and swapping the snapshot there
/// must not require an `.await`.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Pool>,
    pub registry: Arc<Registry>,
    pub router: Arc<Router>,
    pub sessions: Arc<SessionManager>,
    pub gateway: Arc<GatewayServer>,
    pub reconciler: Arc<Reconciler>,
    pub snapshot: Arc<Mutex<ConfigSnapshot>>,
    pub started_at: Instant,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn current_snapshot(&self) -> ConfigSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
