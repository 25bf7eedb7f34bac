//! Collaborator traits: the triple-store client and the schema source.

use crate::schema::EntitySchema;
use async_trait::async_trait;
use rdfmap_json_ld::Quad;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use thiserror::Error;

/// Transport-level failure reported by a client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Opaque request parameters forwarded to the client.
pub type QueryParams = Map<String, JsonValue>;

/// One bound value in SPARQL JSON results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingValue {
    /// `uri`, `literal`, `typed-literal` or `bnode`
    #[serde(rename = "type")]
    pub term_type: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl BindingValue {
    pub fn uri(iri: impl Into<String>) -> Self {
        Self {
            term_type: "uri".to_string(),
            value: iri.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            term_type: "literal".to_string(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::literal(value)
        }
    }

    pub fn is_iri(&self) -> bool {
        self.term_type == "uri"
    }

    pub fn is_blank(&self) -> bool {
        self.term_type == "bnode"
    }
}

/// The `results` part of SPARQL JSON results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, BindingValue>>,
}

/// Async client for a SPARQL endpoint.
#[async_trait]
pub trait SparqlClient: Send + Sync {
    async fn sparql_select(&self, query: &str, params: &QueryParams) -> Result<SelectResults, ClientError>;

    async fn sparql_construct(&self, query: &str, params: &QueryParams) -> Result<Vec<Quad>, ClientError>;

    /// Run an update; the response body is returned uninterpreted.
    async fn sparql_update(&self, query: &str, params: &QueryParams) -> Result<JsonValue, ClientError>;
}

/// Lookup of schemas referenced by IRI.
pub trait SchemaProvider: Send + Sync {
    fn get(&self, iri: &str) -> Option<EntitySchema>;
}

/// In-memory schemas keyed by their `@id`.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaProvider {
    schemas: HashMap<String, EntitySchema>,
}

impl StaticSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.id.clone(), schema);
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn get(&self, iri: &str) -> Option<EntitySchema> {
        self.schemas.get(iri).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_sparql_json_bindings() {
        let results: SelectResults = serde_json::from_value(json!({
            "bindings": [{
                "eIri0": {"type": "uri", "value": "http://example.org/a"},
                "label0": {"type": "literal", "value": "A", "xml:lang": "en"},
                "count0": {"type": "literal", "value": "3",
                           "datatype": "http://www.w3.org/2001/XMLSchema#integer"}
            }]
        }))
        .unwrap();
        let row = &results.bindings[0];
        assert!(row["eIri0"].is_iri());
        assert_eq!(row["label0"].lang.as_deref(), Some("en"));
        assert_eq!(
            row["count0"],
            BindingValue::typed("3", "http://www.w3.org/2001/XMLSchema#integer")
        );
    }
}
