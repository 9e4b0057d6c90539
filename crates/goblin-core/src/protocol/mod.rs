//! Protocol Layer - JSON-RPC 2.0 and MCP Implementation
//!
//! JSON-RPC 2.0 framing, MCP protocol types, and the transport abstraction
//! traits implementations build on.
//!
//! ## Module Organization
//!
//! - `message`: JSON-RPC 2.0 and MCP message types with trait-based serialization
//! - `types`: MCP protocol-specific types and enumerations
//! - `errors`: Consolidated error types for all protocol operations

// Layer 1: Standard library imports
// (None required for module declarations)

// Layer 2: Third-party crate imports
// (None required for module declarations)

// Layer 3: Internal module imports
// (Will be added as consolidation proceeds)

// Module declarations (workspace standard: declarations only in mod.rs)
pub mod constants;
pub mod errors;
pub mod message;
pub mod types;

// Public re-exports (workspace standard: clean API surface)

pub use constants::*;
pub use errors::*;
pub use message::*;
pub use types::*;
