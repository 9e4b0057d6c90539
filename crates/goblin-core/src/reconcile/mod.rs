//! Configuration reconciler: diffs snapshots, drives the pool and registry
//!
//! Split into a pure half ([`events::diff`]) and a side-effecting half
//! ([`manager::Reconciler::drive`]) so the diff logic is unit-testable
//! without a live pool/registry/gateway.

pub mod events;
pub mod manager;

pub use events::{diff, ReconcileEvent};
pub use manager::Reconciler;
