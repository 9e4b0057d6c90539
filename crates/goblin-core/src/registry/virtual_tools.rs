//! Virtual tools: config-declared names with no backend, no scripting
//!
//! `spec.md` §6 names `virtualTools?` in the config schema and scopes full
//! scripting out. This registers each declared name as an ordinary
//! `CapabilityCard` (no backend owner) so the config surface round-trips
//! through listing; calling one returns `UnknownCapability`-free but
//! explicit "not yet implemented" content rather than a routing error.

// Layer 2: Third-party crate imports
use serde_json::json;

// Layer 3: Internal module imports
use crate::config::VirtualToolSpec;
use crate::protocol::Content;
use crate::registry::card::{CapabilityCard, CapabilityKind};

/// The pseudo server name virtual tools are qualified under.
pub const VIRTUAL_SERVER_NAME: &str = "virtual";

pub fn cards_for(specs: &[VirtualToolSpec]) -> Vec<CapabilityCard> {
    specs
        .iter()
        .map(|spec| {
            let qualified = format!("{VIRTUAL_SERVER_NAME}_{}", spec.name);
            CapabilityCard::new(
                CapabilityKind::Tool,
                VIRTUAL_SERVER_NAME,
                &spec.name,
                qualified,
                spec.description.clone().unwrap_or_default(),
                Some(json!({ "type": "object", "properties": {} })),
            )
        })
        .collect()
}

/// Response for any call routed to a virtual tool.
pub fn not_implemented_response(name: &str) -> Vec<Content> {
    vec![Content::text(format!(
        "virtual tool \"{name}\" is configured but has no scripted implementation"
    ))]
}
