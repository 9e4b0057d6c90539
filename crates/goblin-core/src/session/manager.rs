//! Session manager: issues, indexes, resumes, and GCs front-side sessions

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::session::error::{SessionError, SessionResult};
use crate::session::handle::{Session, SessionHandle, SessionState};

/// Default cap on concurrently open sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default idle timeout before a session is GC'd.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct SessionManager {
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    max_sessions: usize,
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize, session_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            max_sessions,
            session_timeout,
        })
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TIMEOUT)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create a brand-new session, rejecting it over `maxSessions`.
    pub fn create(&self, transport_kind: impl Into<String>, compatibility_mode: bool) -> SessionResult<Arc<SessionHandle>> {
        if self.sessions.len() >= self.max_sessions {
            return Err(SessionError::OverCapacity {
                max: self.max_sessions,
            });
        }
        let id = Uuid::new_v4();
        let handle = Arc::new(SessionHandle::new(Session::new(id, transport_kind, compatibility_mode)));
        self.sessions.insert(id, Arc::clone(&handle));
        info!(session = %id, "session created");
        Ok(handle)
    }

    /// Resume an existing session on a new transport, or fail with
    /// `NotFound` so the caller re-initializes (`spec.md` §4.8, the
    /// streamable-HTTP 404 contract).
    pub async fn attach_or_create(
        &self,
        session_id: Option<Uuid>,
        transport_kind: impl Into<String>,
        compatibility_mode: bool,
    ) -> SessionResult<Arc<SessionHandle>> {
        match session_id {
            None => self.create(transport_kind, compatibility_mode),
            Some(id) => {
                let handle = self.sessions.get(&id).map(|e| Arc::clone(e.value()));
                match handle {
                    Some(handle) => {
                        let mut session = handle.session.lock().await;
                        if session.state == SessionState::Closed {
                            return Err(SessionError::NotFound { id });
                        }
                        session.touch();
                        drop(session);
                        debug!(session = %id, "session resumed");
                        Ok(handle)
                    }
                    None => Err(SessionError::NotFound { id }),
                }
            }
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|e| Arc::clone(e.value()))
    }

    /// Remove and return a session, e.g. on transport close.
    pub fn remove(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    /// Sweep idle sessions past `sessionTimeout`, marking them `Closed` and
    /// removing them from the index.
    pub async fn sweep_idle(&self) {
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value().session.lock().await;
            if session.idle_for() >= self.session_timeout {
                expired.push(*entry.key());
            }
        }
        for id in expired {
            if let Some((_, handle)) = self.sessions.remove(&id) {
                let mut session = handle.session.lock().await;
                session.state = SessionState::Closed;
                info!(session = %id, "session expired and removed");
            }
        }
    }
}
