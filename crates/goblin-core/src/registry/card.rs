//! `CapabilityCard`: the compact descriptor the registry aggregates

// Layer 2: Third-party crate imports
use serde::Serialize;
use serde_json::Value;

/// Kind of capability a backend advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    Tool,
    Prompt,
    Resource,
    ResourceTemplate,
}

/// A compact descriptor for one discovered tool/prompt/resource/template.
///
/// `full_schema` is populated directly from the originating `list*` call —
/// the MCP list operations already return full schemas inline, so there is
/// no separate describe round trip to defer; "fetched lazily" from
/// `spec.md` §3 is satisfied by simply not re-deriving it until a `describe`
/// call reads this field.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityCard {
    pub kind: CapabilityKind,
    pub local_name: String,
    pub qualified_name: String,
    pub server_name: String,
    pub summary: String,
    pub full_schema: Option<Value>,
    /// False while the owning backend is outside Ready during its grace
    /// period; `Registry::resolve` treats an unavailable card as
    /// not-yet-evicted for `describe`/listing purposes but refuses to
    /// resolve it, so the router never dispatches to it.
    pub available: bool,
}

impl CapabilityCard {
    pub fn new(
        kind: CapabilityKind,
        server_name: impl Into<String>,
        local_name: impl Into<String>,
        qualified_name: impl Into<String>,
        summary: impl Into<String>,
        full_schema: Option<Value>,
    ) -> Self {
        Self {
            kind,
            local_name: local_name.into(),
            qualified_name: qualified_name.into(),
            server_name: server_name.into(),
            summary: first_sentence(&summary.into()),
            full_schema,
            available: true,
        }
    }
}

/// Truncate a description to its first sentence, per `spec.md` §3's
/// `summary` field definition.
fn first_sentence(description: &str) -> String {
    match description.find(". ") {
        Some(idx) => description[..=idx].trim_end().to_string(),
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_first_sentence() {
        let card = CapabilityCard::new(
            CapabilityKind::Tool,
            "fs",
            "read",
            "fs_read",
            "Reads a file. Returns its contents as text.",
            None,
        );
        assert_eq!(card.summary, "Reads a file.");
    }

    #[test]
    fn keeps_whole_description_without_a_period() {
        let card = CapabilityCard::new(
            CapabilityKind::Tool,
            "fs",
            "read",
            "fs_read",
            "Reads a file",
            None,
        );
        assert_eq!(card.summary, "Reads a file");
    }
}
