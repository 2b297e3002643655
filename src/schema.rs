//! JSON-schema sanitization for the model API.
//!
//! MCP servers often emit schemas with `title` annotations that some chat
//! APIs reject in function declarations. Sanitization strips `title` at the
//! top level and recursively inside every value under `properties`, leaving
//! everything else untouched.

use serde_json::Value;

/// Remove `title` keys from a JSON-schema-like value.
///
/// Non-object inputs pass through unchanged. Idempotent: sanitizing an
/// already-sanitized schema is a no-op. Only `title` is ever removed, so the
/// set of required and validated fields is preserved.
pub fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                if key == "title" {
                    continue;
                }
                if key == "properties" {
                    if let Value::Object(props) = value {
                        let cleaned = props
                            .iter()
                            .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                            .collect();
                        out.insert(key.clone(), Value::Object(cleaned));
                        continue;
                    }
                }
                out.insert(key.clone(), value.clone());
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
