//! Normalization of MCP tool-result payloads.
//!
//! Servers return tool results in several shapes: a list of content items, a
//! text content item, a plain mapping, or something else entirely. The
//! payload is modeled as an explicit variant type so the normalizer is an
//! exhaustive match rather than a chain of ad-hoc shape checks.

use serde::Deserialize;
use serde_json::Value;

/// A tool-result payload of one of the shapes MCP servers produce.
///
/// Variants are tried in declaration order. Only objects tagged
/// `type: "text"` classify as `Text`; a plain mapping that merely has a
/// `text` key stays a `Mapping`. Any JSON value deserializes into one of
/// the variants; `Opaque` is the catch-all.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolPayload {
    /// A text content item, `{"type": "text", "text": "..."}`.
    Text {
        #[serde(rename = "type")]
        content_type: TextContentType,
        text: String,
    },
    /// A list of payload items.
    List(Vec<ToolPayload>),
    /// A plain JSON mapping with no textual payload.
    Mapping(serde_json::Map<String, Value>),
    /// Anything else (null, string, number, bool).
    Opaque(Value),
}

/// The `type` tag of an MCP text content item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextContentType {
    Text,
}

impl Default for ToolPayload {
    fn default() -> Self {
        ToolPayload::Opaque(Value::Null)
    }
}

/// Convert a tool-result payload into a JSON value safe to embed in the
/// transcript.
///
/// Total: every payload shape maps to some JSON value. Unknown shapes
/// degrade to their string form rather than failing, since this sits on the
/// path that must always report something back to the model.
pub fn normalize(payload: &ToolPayload) -> Value {
    match payload {
        ToolPayload::Text { text, .. } => Value::String(text.clone()),
        ToolPayload::List(items) => Value::Array(items.iter().map(normalize).collect()),
        ToolPayload::Mapping(map) => Value::Object(map.clone()),
        ToolPayload::Opaque(Value::Null) => Value::Null,
        ToolPayload::Opaque(Value::String(s)) => Value::String(s.clone()),
        ToolPayload::Opaque(other) => Value::String(other.to_string()),
    }
}

/// Flatten a payload into plain text, for log lines and error messages.
pub fn to_text(payload: &ToolPayload) -> String {
    match normalize(payload) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
