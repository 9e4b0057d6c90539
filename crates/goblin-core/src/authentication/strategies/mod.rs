//! Authentication Strategies
//!
//! Goblin's auth non-goals (spec §1) limit this to a single static shared
//! secret plus an explicit dev-mode bypass — no OAuth2, no RBAC. The
//! `AuthenticationStrategy` trait still allows a second strategy to be
//! plugged in later without touching the gateway server.

// Layer 1: Standard library imports

// Layer 2: Third-party crate imports

// Layer 3: Internal module imports

pub mod apikey;

// Re-exports for convenience
pub use apikey::{ApiKeyRequest, ApiKeySource, ApiKeyStrategy};
