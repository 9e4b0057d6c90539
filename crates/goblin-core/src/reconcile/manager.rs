//! Driving reconcile events into the pool and registry
//!
//! `Reconciler::apply` is the pure diff from [`crate::reconcile::events`];
//! `Reconciler::drive` is the side-effecting half, run once per successful
//! reload by both the file watcher (`config::watcher::ConfigWatcher`) and
//! the SIGHUP handler in the binary crate, so both paths exercise identical
//! logic.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tracing::{info, warn};

// Layer 3: Internal module imports
use crate::config::ConfigSnapshot;
use crate::gateway::GatewayServer;
use crate::pool::Pool;
use crate::reconcile::events::{diff, ReconcileEvent};
use crate::registry::{virtual_tools, Registry};
use crate::router::Router;

/// Wires config diffs into the live pool, registry, and router.
pub struct Reconciler {
    pool: Arc<Pool>,
    registry: Arc<Registry>,
    router: Arc<Router>,
    gateway: Arc<GatewayServer>,
}

impl Reconciler {
    pub fn new(
        pool: Arc<Pool>,
        registry: Arc<Registry>,
        router: Arc<Router>,
        gateway: Arc<GatewayServer>,
    ) -> Self {
        Self { pool, registry, router, gateway }
    }

    /// Pure diff between two snapshots; see [`crate::reconcile::events::diff`].
    pub fn apply(old: &ConfigSnapshot, new: &ConfigSnapshot) -> Vec<ReconcileEvent> {
        diff(old, new)
    }

    /// Apply `events` to the pool/registry, then re-point aliases and
    /// virtual tools at `new`. Each event is handled independently; a single
    /// backend failing to connect does not abort the rest of the batch.
    pub async fn drive(&self, events: Vec<ReconcileEvent>, new: &ConfigSnapshot) {
        for event in events {
            match event {
                ReconcileEvent::Removed(spec) => {
                    self.evict(&spec.name).await;
                }
                ReconcileEvent::Modified { old, new: new_spec } => {
                    self.evict(&old.name).await;
                    self.introduce(new_spec).await;
                }
                ReconcileEvent::Added(spec) => {
                    self.introduce(spec).await;
                }
            }
        }

        self.registry.set_aliases(&new.aliases).await;
        self.registry
            .replace_virtual_tools(virtual_tools::cards_for(&new.virtual_tools))
            .await;
        self.router.invalidate_all();
    }

    async fn evict(&self, server_name: &str) {
        self.router.invalidate_server(server_name);
        let Some(slot) = self.pool.remove(server_name) else {
            return;
        };
        let mut slot = slot.lock().await;
        if let Some(client) = slot.client.take() {
            match Arc::try_unwrap(client) {
                Ok(client) => {
                    if let Err(e) = client.shutdown().await {
                        warn!(server = server_name, error = %e, "error shutting down evicted backend");
                    }
                }
                Err(_) => {
                    warn!(server = server_name, "evicted backend still had in-flight callers");
                }
            }
        }
        drop(slot);
        self.registry.evict_backend(server_name.to_string()).await;
        info!(server = server_name, "backend evicted by reconciler");
    }

    async fn introduce(&self, spec: crate::config::ServerSpec) {
        let name = spec.name.clone();
        self.pool.add(spec);
        self.connect_and_sync(&name, "reconciler").await;
    }

    /// Re-acquire a backend that left `Ready` (e.g. its child process died).
    /// Unlike [`Self::introduce`] this never touches the pool's slot map —
    /// the `ServerSpec` is already registered — it just asks the pool to
    /// reconnect, which is the only path that actually replaces a dead
    /// `BackendClient` (`Pool::probe` only re-pings the existing one).
    /// Called periodically from the binary crate's health sweep for every
    /// backend not currently `Ready`.
    pub async fn try_recover(&self, server_name: &str) {
        self.connect_and_sync(server_name, "health sweep").await;
    }

    async fn connect_and_sync(&self, name: &str, caller: &str) {
        match self.pool.acquire(name).await {
            Ok(client) => {
                if let Some(backend) = self.pool.backend_snapshot(name).await {
                    self.registry.sync_backend(name, &client, &backend).await;
                }
                self.gateway.spawn_backend_notification_bridge(name.to_string(), client);
                info!(server = %name, %caller, "backend connected");
            }
            Err(e) => {
                warn!(server = %name, %caller, error = %e, "backend connect failed; will retry");
            }
        }
    }
}
