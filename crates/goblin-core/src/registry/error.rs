//! Capability registry errors

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`crate::registry::Registry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Qualified name (or alias) not present in the registry.
    #[error("unknown capability: {name}")]
    UnknownCapability { name: String },

    /// Alias target collides with an existing alias or qualified name.
    #[error("alias {alias} already maps to {existing}")]
    AliasConflict { alias: String, existing: String },
}

/// Convenience result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
