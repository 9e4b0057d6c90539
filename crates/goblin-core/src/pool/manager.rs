//! Connection pool and per-backend lifecycle manager
//!
//! One [`PoolSlot`] per configured backend, holding its [`Backend`] state, a
//! lazily-established [`BackendClient`], its lifecycle policy
//! (`spec.md` §4.4's Stateful/Stateless/Smart), and a [`CircuitBreaker`]. The
//! global map is a `DashMap` guarded only for insert/delete; each slot's
//! `tokio::sync::Mutex` is the single-flight guard for that backend's
//! (re)connect — concurrent `acquire` callers simply queue on the lock
//! instead of racing to reconnect, mirroring §5's locking rules.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Instant;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// Layer 3: Internal module imports
use crate::backend::{Backend, BackendClient, BackendState};
use crate::config::{ConfigSnapshot, ServerMode, ServerSpec};
use crate::pool::breaker::{Backoff, CircuitBreaker};
use crate::pool::error::{PoolError, PoolResult};

/// Everything the pool tracks for one configured backend.
pub struct PoolSlot {
    pub backend: Backend,
    pub client: Option<Arc<BackendClient>>,
    pub policy: ServerMode,
    pub breaker: CircuitBreaker,
    pub backoff: Backoff,
    /// Earliest time a reconnect attempt may run again, set after a failed
    /// connect per the exponential backoff schedule (`spec.md` §4.4).
    pub next_attempt_at: Option<Instant>,
}

impl PoolSlot {
    fn new(spec: ServerSpec) -> Self {
        let policy = spec.mode;
        Self {
            backend: Backend::new(spec),
            client: None,
            policy,
            breaker: CircuitBreaker::default(),
            backoff: Backoff::new(),
            next_attempt_at: None,
        }
    }
}

/// The connection pool: one slot per backend name.
pub struct Pool {
    slots: DashMap<String, Arc<Mutex<PoolSlot>>>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Register a backend freshly introduced by the config reconciler.
    /// Stateful backends are eagerly connected on first `acquire`, matching
    /// "connect at startup and on every config-add" once the caller calls
    /// `acquire` for it during reconcile.
    pub fn add(&self, spec: ServerSpec) {
        let name = spec.name.clone();
        self.slots.insert(name, Arc::new(Mutex::new(PoolSlot::new(spec))));
    }

    /// Evict a backend removed from config. Returns the slot so the caller
    /// can gracefully shut down its client outside the pool map's lock.
    pub fn remove(&self, name: &str) -> Option<Arc<Mutex<PoolSlot>>> {
        self.slots.remove(name).map(|(_, slot)| slot)
    }

    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot of a backend's state, for the registry and admin plane.
    pub async fn backend_snapshot(&self, name: &str) -> Option<Backend> {
        let slot = self.slots.get(name).map(|e| Arc::clone(e.value()))?;
        Some(slot.lock().await.backend.clone())
    }

    /// Seed a pool from a config snapshot at startup.
    pub fn load(&self, snapshot: &ConfigSnapshot) {
        for spec in snapshot.servers.values() {
            if spec.enabled {
                self.add(spec.clone());
            }
        }
    }

    /// Return a ready backend client, (re)connecting if necessary. At most
    /// one reconnect attempt is in flight per backend at any time, since the
    /// per-slot mutex is held across the connect await.
    pub async fn acquire(&self, name: &str) -> PoolResult<Arc<BackendClient>> {
        let slot_arc = self
            .slots
            .get(name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| PoolError::UnknownBackend {
                server: name.to_string(),
            })?;

        let mut slot = slot_arc.lock().await;

        if let Some(client) = &slot.client {
            if matches!(slot.backend.state, BackendState::Ready) {
                return Ok(Arc::clone(client));
            }
        }

        if slot.breaker.is_open(slot.backend.failure_streak) {
            return Err(PoolError::BackendUnavailable {
                server: name.to_string(),
                reason: "circuit open, awaiting health probe".to_string(),
            });
        }

        if let Some(at) = slot.next_attempt_at {
            if Instant::now() < at {
                return Err(PoolError::BackendUnavailable {
                    server: name.to_string(),
                    reason: "backoff: retry not yet due".to_string(),
                });
            }
        }

        slot.backend.state = BackendState::Connecting;
        debug!(server = name, "connecting backend");

        match BackendClient::connect(&slot.backend.spec).await {
            Ok((client, init_response)) => {
                slot.backend.apply_initialize(&init_response);
                slot.backend.record_success();
                slot.backend.state = BackendState::Ready;
                slot.backoff.reset();
                slot.next_attempt_at = None;
                let client = Arc::new(client);
                slot.client = Some(Arc::clone(&client));
                info!(server = name, "backend ready");
                Ok(client)
            }
            Err(err) => {
                let streak = slot.backend.record_failure();
                slot.backend.state = if slot.breaker.is_open(streak) {
                    BackendState::Degraded
                } else {
                    BackendState::Failed
                };
                let delay = slot.backoff.next();
                slot.next_attempt_at = Some(Instant::now() + delay);
                warn!(server = name, error = %err, streak, delay_ms = delay.as_millis() as u64, "backend connect failed");
                Err(PoolError::BackendUnavailable {
                    server: name.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Issue a health-probe `ping` against a `Degraded` backend; promotes it
    /// back to `Ready` on success, resetting its failure streak.
    pub async fn probe(&self, name: &str) -> PoolResult<()> {
        let slot_arc = self
            .slots
            .get(name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| PoolError::UnknownBackend {
                server: name.to_string(),
            })?;
        let mut slot = slot_arc.lock().await;
        let Some(client) = slot.client.clone() else {
            return Err(PoolError::BackendUnavailable {
                server: name.to_string(),
                reason: "no client to probe".to_string(),
            });
        };
        match client.ping().await {
            Ok(()) => {
                slot.backend.record_success();
                slot.backend.state = BackendState::Ready;
                Ok(())
            }
            Err(err) => {
                slot.backend.record_failure();
                Err(PoolError::BackendUnavailable {
                    server: name.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Record a failed in-flight call against a backend that `acquire`
    /// handed out as `Ready`. Unlike `acquire`'s own failure path (a failed
    /// *connect*), this covers a backend whose actor task died between
    /// calls (transport-level send failure) — without this, a crash that
    /// happens between two `acquire`s never updates `backend.state`, so the
    /// health sweep in the binary crate never notices it needs recovering.
    /// Does not drop the stale client; the next `acquire` still takes the
    /// fast path on `client.is_some()` but fails the `state == Ready` check
    /// below and reconnects.
    pub async fn mark_call_failed(&self, name: &str) {
        let Some(slot_arc) = self.slots.get(name).map(|e| Arc::clone(e.value())) else {
            return;
        };
        let mut slot = slot_arc.lock().await;
        let streak = slot.backend.record_failure();
        slot.backend.state = if slot.breaker.is_open(streak) {
            BackendState::Degraded
        } else {
            BackendState::Failed
        };
        warn!(server = name, streak, "backend call failed");
    }

    /// Disconnect backends that are idle past their policy's threshold:
    /// `Smart` backends past `idleTimeoutMs`, `Stateless` backends
    /// immediately after any idle tick (no persistent connection is kept).
    /// `Stateful` backends are never disconnected by this sweep.
    pub async fn sweep_idle(&self) {
        for entry in self.slots.iter() {
            let slot_arc = Arc::clone(entry.value());
            let mut slot = slot_arc.lock().await;
            if slot.client.is_none() || !matches!(slot.backend.state, BackendState::Ready) {
                continue;
            }
            let should_disconnect = match slot.policy {
                ServerMode::Stateful => false,
                ServerMode::Stateless => true,
                ServerMode::Smart => {
                    let timeout_ms = slot.backend.spec.idle_timeout_ms.unwrap_or(0);
                    timeout_ms > 0
                        && Instant::now().duration_since(slot.backend.last_activity).as_millis()
                            as u64
                            >= timeout_ms
                }
            };
            if should_disconnect {
                if let Some(client) = slot.client.take() {
                    if let Ok(client) = Arc::try_unwrap(client) {
                        let _ = client.shutdown().await;
                    }
                    slot.backend.state = BackendState::Disconnected;
                    debug!(server = entry.key().as_str(), "idle backend disconnected");
                }
            }
        }
    }
}
