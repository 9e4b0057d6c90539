//! Route cache: `qualifiedName -> (serverName, localName)`
//!
//! Invalidated wholesale on any registry change, or selectively when a
//! single `serverName` enters/leaves Ready (`spec.md` §4.6). Calls already
//! resolved and in flight are unaffected by invalidation — the router only
//! consults the cache before acquiring the backend, never mid-call.

// Layer 2: Third-party crate imports
use dashmap::DashMap;

/// One cached resolution: the backend and local name a qualified name maps to.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub server_name: String,
    pub local_name: String,
}

#[derive(Default)]
pub struct RouteCache {
    entries: DashMap<String, RouteEntry>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, qualified_name: &str) -> Option<RouteEntry> {
        self.entries.get(qualified_name).map(|e| e.value().clone())
    }

    pub fn insert(&self, qualified_name: String, entry: RouteEntry) {
        self.entries.insert(qualified_name, entry);
    }

    /// Drop every cached route, e.g. on a registry-wide change event.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Drop only routes pointing at one backend, e.g. when it leaves Ready.
    pub fn invalidate_server(&self, server_name: &str) {
        self.entries.retain(|_, entry| entry.server_name != server_name);
    }
}
