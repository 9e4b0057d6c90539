//! Pure diff between two config snapshots
//!
//! `diff` never touches the pool, registry, or filesystem; it is a plain
//! function over two `ConfigSnapshot` values so it is unit-testable without
//! a live gateway. [`crate::reconcile::manager::Reconciler::drive`] is the
//! side-effecting half that turns these events into pool/registry calls.

// Layer 1: Standard library imports
use std::collections::HashSet;

// Layer 3: Internal module imports
use crate::config::{ConfigSnapshot, ServerSpec};

/// One server-level change between two snapshots.
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    /// A server present in `old` is absent (or disabled) in `new`.
    Removed(ServerSpec),
    /// A server is present in both but its spec changed. Carried as a pair
    /// so `drive` can implement it as remove-then-add per `spec.md` §4.1.
    Modified { old: ServerSpec, new: ServerSpec },
    /// A server present (and enabled) in `new` was absent (or disabled) in `old`.
    Added(ServerSpec),
}

/// Compute the ordered {removed} -> {modified} -> {added} event stream
/// between two validated snapshots. A server counts as "present" only when
/// `enabled`; toggling `enabled` off is a `Removed`, toggling it on is an
/// `Added`, matching how the pool only ever holds slots for enabled servers.
pub fn diff(old: &ConfigSnapshot, new: &ConfigSnapshot) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();

    let old_names: HashSet<&String> = old.servers.keys().collect();
    let new_names: HashSet<&String> = new.servers.keys().collect();

    let mut removed: Vec<&String> = old_names.difference(&new_names).copied().collect();
    removed.sort();
    for name in removed {
        let spec = &old.servers[name];
        if spec.enabled {
            events.push(ReconcileEvent::Removed(spec.clone()));
        }
    }

    let mut common: Vec<&String> = old_names.intersection(&new_names).copied().collect();
    common.sort();
    for name in common {
        let old_spec = &old.servers[name];
        let new_spec = &new.servers[name];
        match (old_spec.enabled, new_spec.enabled) {
            (true, false) => events.push(ReconcileEvent::Removed(old_spec.clone())),
            (false, true) => events.push(ReconcileEvent::Added(new_spec.clone())),
            (true, true) if old_spec != new_spec => events.push(ReconcileEvent::Modified {
                old: old_spec.clone(),
                new: new_spec.clone(),
            }),
            _ => {}
        }
    }

    let mut added: Vec<&String> = new_names.difference(&old_names).copied().collect();
    added.sort();
    for name in added {
        let spec = &new.servers[name];
        if spec.enabled {
            events.push(ReconcileEvent::Added(spec.clone()));
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, validate};

    fn snapshot(json: &str) -> ConfigSnapshot {
        let doc = parse(json).unwrap();
        validate(&doc).unwrap()
    }

    const BASE: &str = r#"{
        "servers": [
            {"name": "alpha", "transport": "stdio", "command": "alpha-bin"},
            {"name": "beta", "transport": "http", "url": "http://localhost:9001"}
        ],
        "gateway": {"host": "127.0.0.1", "port": 8080},
        "auth": {"mode": "none"},
        "policies": {}
    }"#;

    #[test]
    fn identical_snapshots_produce_no_events() {
        let a = snapshot(BASE);
        let b = snapshot(BASE);
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn removed_server_produces_removed_event() {
        let a = snapshot(BASE);
        let b = snapshot(
            r#"{
                "servers": [
                    {"name": "alpha", "transport": "stdio", "command": "alpha-bin"}
                ],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        );
        let events = diff(&a, &b);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ReconcileEvent::Removed(spec) if spec.name == "beta"));
    }

    #[test]
    fn added_server_produces_added_event() {
        let a = snapshot(BASE);
        let b = snapshot(
            r#"{
                "servers": [
                    {"name": "alpha", "transport": "stdio", "command": "alpha-bin"},
                    {"name": "beta", "transport": "http", "url": "http://localhost:9001"},
                    {"name": "gamma", "transport": "http", "url": "http://localhost:9002"}
                ],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        );
        let events = diff(&a, &b);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ReconcileEvent::Added(spec) if spec.name == "gamma"));
    }

    #[test]
    fn changed_spec_produces_modified_event() {
        let a = snapshot(BASE);
        let b = snapshot(
            r#"{
                "servers": [
                    {"name": "alpha", "transport": "stdio", "command": "alpha-bin-v2"},
                    {"name": "beta", "transport": "http", "url": "http://localhost:9001"}
                ],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        );
        let events = diff(&a, &b);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ReconcileEvent::Modified { new, .. } if new.name == "alpha"));
    }

    #[test]
    fn disabling_a_server_is_a_removal() {
        let a = snapshot(BASE);
        let b = snapshot(
            r#"{
                "servers": [
                    {"name": "alpha", "transport": "stdio", "command": "alpha-bin"},
                    {"name": "beta", "transport": "http", "url": "http://localhost:9001", "enabled": false}
                ],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        );
        let events = diff(&a, &b);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ReconcileEvent::Removed(spec) if spec.name == "beta"));
    }

    #[test]
    fn events_are_ordered_removed_then_modified_then_added() {
        let a = snapshot(BASE);
        let b = snapshot(
            r#"{
                "servers": [
                    {"name": "alpha", "transport": "stdio", "command": "alpha-bin-v2"},
                    {"name": "gamma", "transport": "http", "url": "http://localhost:9002"}
                ],
                "gateway": {"host": "127.0.0.1", "port": 8080},
                "auth": {"mode": "none"},
                "policies": {}
            }"#,
        );
        let events = diff(&a, &b);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ReconcileEvent::Removed(spec) if spec.name == "beta"));
        assert!(matches!(&events[1], ReconcileEvent::Modified { new, .. } if new.name == "alpha"));
        assert!(matches!(&events[2], ReconcileEvent::Added(spec) if spec.name == "gamma"));
    }
}
