//! Result decoders: SELECT bindings and CONSTRUCT graphs back to objects.

pub mod graph;
pub mod tabular;

pub use graph::{collection_context, decode_graph, entity_context};
pub(crate) use graph::decode_graph_nodes;
pub use tabular::{coerce_binding, decode_bindings};

use crate::constraint::EntConstr;
use crate::entity::EntityFragment;
use serde_json::{Number, Value as JsonValue};

/// Output carries `@type`: asked for by name, implied by a full selection, or resolved.
pub(crate) fn type_requested(ent: &EntConstr, frag: &EntityFragment) -> bool {
    ent.resolve_type
        || frag.selected.iter().any(|k| k == "@type")
        || (ent.variables.is_none() && ent.schema.has_property("@type"))
}

pub(crate) fn parse_integer(s: &str) -> JsonValue {
    s.trim()
        .parse::<i64>()
        .map(JsonValue::from)
        .unwrap_or_else(|_| JsonValue::String(s.to_string()))
}

pub(crate) fn parse_number(s: &str) -> JsonValue {
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(s.to_string()))
}

pub(crate) fn parse_boolean(s: &str) -> JsonValue {
    match s.trim() {
        "true" | "1" => JsonValue::Bool(true),
        "false" | "0" => JsonValue::Bool(false),
        _ => JsonValue::String(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_parsers() {
        assert_eq!(parse_integer("42"), json!(42));
        assert_eq!(parse_integer("4.2"), json!("4.2"));
        assert_eq!(parse_number("4.5"), json!(4.5));
        assert_eq!(parse_boolean("1"), json!(true));
        assert_eq!(parse_boolean("no"), json!("no"));
    }
}
