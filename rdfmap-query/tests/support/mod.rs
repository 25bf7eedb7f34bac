//! In-memory endpoint for integration tests.
//!
//! Records every query it receives and answers SELECTs from canned results
//! routed by a substring of the query text.
#![allow(dead_code)]

use async_trait::async_trait;
use rdfmap_json_ld::{Quad, QuadTerm};
use rdfmap_query::{
    BindingValue, ClientError, EntitySchema, QueryParams, SelectResults, SparqlClient,
    StaticSchemaProvider,
};
use rdfmap_vocab::NamespaceMap;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockClient {
    selects: Vec<(String, SelectResults)>,
    quads: Vec<Quad>,
    failure: Option<ClientError>,
    queries: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer SELECTs containing `needle` with `results`; first match wins.
    pub fn with_select(mut self, needle: &str, results: SelectResults) -> Self {
        self.selects.push((needle.to_string(), results));
        self
    }

    pub fn with_quads(mut self, quads: Vec<Quad>) -> Self {
        self.quads = quads;
        self
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, query: &str) -> Result<(), ClientError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SparqlClient for MockClient {
    async fn sparql_select(&self, query: &str, _params: &QueryParams) -> Result<SelectResults, ClientError> {
        self.record(query)?;
        Ok(self
            .selects
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }

    async fn sparql_construct(&self, query: &str, _params: &QueryParams) -> Result<Vec<Quad>, ClientError> {
        self.record(query)?;
        Ok(self.quads.clone())
    }

    async fn sparql_update(&self, query: &str, _params: &QueryParams) -> Result<JsonValue, ClientError> {
        self.record(query)?;
        Ok(json!({"updated": true}))
    }
}

pub const RM: &str = "http://cpgu.kbpm.ru/ns/rm/rdf#";
pub const EX: &str = "http://example.org/";
pub const CAT: &str = "http://catalog.example.com/ns#";

pub fn namespaces() -> NamespaceMap {
    NamespaceMap::with_defaults()
        .with_prefix("rm", RM)
        .with_prefix("ex", EX)
}

pub fn rows(rows: Vec<Vec<(&str, BindingValue)>>) -> SelectResults {
    SelectResults {
        bindings: rows
            .into_iter()
            .map(|r| {
                r.into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect::<HashMap<_, _>>()
            })
            .collect(),
    }
}

pub fn triple(s: &str, p: &str, o: &str) -> Quad {
    Quad::new(QuadTerm::named(s), QuadTerm::named(p), QuadTerm::named(o))
}

pub fn literal(s: &str, p: &str, value: &str, datatype: Option<&str>) -> Quad {
    Quad::new(QuadTerm::named(s), QuadTerm::named(p), QuadTerm::literal(value, datatype))
}

fn schema(value: JsonValue) -> EntitySchema {
    serde_json::from_value(value).unwrap()
}

pub fn artifact_shape() -> EntitySchema {
    schema(json!({
        "@id": "rm:ArtifactShape",
        "targetClass": "rm:Artifact",
        "@context": {
            "identifier": {"@id": "dcterms:identifier", "@type": "xsd:integer"},
            "title": "dcterms:title"
        },
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "identifier": {"type": "integer"},
            "title": {"type": "string"}
        },
        "required": ["@id"]
    }))
}

pub fn property_shape_shape() -> EntitySchema {
    schema(json!({
        "@id": "sh:PropertyShapeShape",
        "targetClass": "sh:PropertyShape",
        "@context": {
            "path": {"@id": "sh:path", "@type": "@id"},
            "name": "sh:name",
            "minCount": {"@id": "sh:minCount", "@type": "xsd:integer"}
        },
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "path": {"type": "string", "format": "iri"},
            "name": {"type": "string"},
            "minCount": {"type": "integer"}
        },
        "required": ["@id", "path"]
    }))
}

pub fn tagged_shape() -> EntitySchema {
    schema(json!({
        "@id": "ex:TaggedShape",
        "targetClass": "ex:Tagged",
        "@context": {"label": "ex:label", "tags": "ex:tag"},
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "label": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}}
        }
    }))
}

/// Resources under a namespace only the schema's context declares.
pub fn catalog_shape() -> EntitySchema {
    schema(json!({
        "@id": "ex:CatalogShape",
        "targetClass": "ex:Catalog",
        "@context": {"cat": CAT, "label": "ex:label", "tags": "ex:tag"},
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "label": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}}
        }
    }))
}

pub fn event_shape() -> EntitySchema {
    schema(json!({
        "@id": "ex:EventShape",
        "targetClass": "ex:Event",
        "@context": {"title": "ex:title", "at": {"@id": "ex:at", "@type": "xsd:dateTime"}},
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "title": {"type": "string"},
            "at": {"type": "string", "format": "date-time"}
        }
    }))
}

pub fn task_shape() -> EntitySchema {
    schema(json!({
        "@id": "ex:TaskShape",
        "targetClass": "ex:Task",
        "@context": {"label": "ex:label", "project": {"@id": "ex:project", "@type": "@id"}},
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "label": {"type": "string"},
            "project": {"type": "string", "format": "iri"}
        }
    }))
}

pub fn project_shape() -> EntitySchema {
    schema(json!({
        "@id": "ex:ProjectShape",
        "targetClass": "ex:Project",
        "@context": {"title": "ex:title"},
        "properties": {
            "@id": {"type": "string", "format": "iri"},
            "title": {"type": "string"}
        }
    }))
}

pub fn schemas() -> StaticSchemaProvider {
    StaticSchemaProvider::new()
        .with_schema(artifact_shape())
        .with_schema(property_shape_shape())
        .with_schema(tagged_shape())
        .with_schema(catalog_shape())
        .with_schema(event_shape())
        .with_schema(task_shape())
        .with_schema(project_shape())
}
