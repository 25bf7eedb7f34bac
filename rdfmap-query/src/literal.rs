//! JSON values to RDF terms, by property kind.

use crate::schema::ValueKind;
use chrono::{DateTime, SecondsFormat, Utc};
use rdfmap_sparql::ast::{Literal, Term};
use rdfmap_vocab::{xsd, NamespaceMap};
use serde_json::Value as JsonValue;

/// Encode one JSON value for a property of `kind`.
///
/// Arrays are encoded by their element kind; callers iterate array values.
pub fn encode_value(value: &JsonValue, kind: &ValueKind, ns: &NamespaceMap) -> Term {
    match kind {
        ValueKind::Array(inner) => encode_value(value, inner, ns),
        ValueKind::Iri | ValueKind::Object => match reference_iri(value) {
            Some(iri) => Term::iri(ns.de_abbreviate(iri)),
            None => Term::Literal(json_literal(value)),
        },
        ValueKind::DateTime => match normalize_date_time(value) {
            Some(dt) => Term::Literal(Literal::typed(dt, xsd::DATE_TIME)),
            None => Term::Literal(json_literal(value)),
        },
        ValueKind::Integer => match value {
            JsonValue::Number(n) => Term::Literal(Literal::typed(n.to_string(), xsd::INTEGER)),
            JsonValue::String(s) => Term::Literal(Literal::typed(s, xsd::INTEGER)),
            other => Term::Literal(json_literal(other)),
        },
        ValueKind::Number => match value {
            JsonValue::Number(n) => Term::Literal(Literal::typed(n.to_string(), xsd::DECIMAL)),
            JsonValue::String(s) => Term::Literal(Literal::typed(s, xsd::DECIMAL)),
            other => Term::Literal(json_literal(other)),
        },
        ValueKind::Boolean => match value {
            JsonValue::Bool(b) => Term::Literal(Literal::boolean(*b)),
            JsonValue::String(s) if s == "true" || s == "false" => {
                Term::Literal(Literal::boolean(s == "true"))
            }
            other => Term::Literal(json_literal(other)),
        },
        ValueKind::String => Term::Literal(json_literal(value)),
    }
}

/// IRI string of a reference value: a string or an object's `@id`.
pub fn reference_iri(value: &JsonValue) -> Option<&str> {
    match value {
        JsonValue::String(s) => Some(s),
        JsonValue::Object(obj) => obj.get("@id").and_then(JsonValue::as_str),
        _ => None,
    }
}

/// Literal chosen from the JSON type alone.
fn json_literal(value: &JsonValue) -> Literal {
    match value {
        JsonValue::String(s) => Literal::string(s),
        JsonValue::Bool(b) => Literal::boolean(*b),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Literal::typed(n.to_string(), xsd::INTEGER),
        JsonValue::Number(n) => Literal::typed(n.to_string(), xsd::DECIMAL),
        other => Literal::string(other.to_string()),
    }
}

/// ISO-8601 string or epoch milliseconds, as UTC with millisecond precision.
///
/// Strings that do not parse as RFC 3339 are passed through unchanged.
pub fn normalize_date_time(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            Err(_) => s.clone(),
        }),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}
