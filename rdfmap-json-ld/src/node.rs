//! Flat node maps built from quads, and per-node compaction.
//!
//! Quads are grouped by subject and then by predicate; `rdf:type` objects
//! become the node's `@type` list. Duplicate values are dropped so a
//! CONSTRUCT that produced the same triple from several solution rows yields
//! a single value.

use crate::compact::ContextCompactor;
use crate::context::{Container, ContextEntry, ParsedContext, TypeValue};
use crate::error::{JsonLdError, Result};
use crate::quad::{Quad, QuadTerm, TermType};
use indexmap::IndexMap;
use rdfmap_vocab::{rdf, xsd};
use serde_json::{Map, Value as JsonValue};

/// An object value of a flat node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    /// Named node (expanded IRI)
    Iri(String),
    /// Blank node, as `_:label`
    Blank(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl NodeValue {
    fn from_term(term: &QuadTerm) -> Result<Self> {
        match term.term_type {
            TermType::NamedNode => Ok(NodeValue::Iri(term.value.clone())),
            TermType::BlankNode => Ok(NodeValue::Blank(blank_id(&term.value))),
            TermType::Literal => Ok(NodeValue::Literal {
                value: term.value.clone(),
                datatype: term.datatype_iri().map(str::to_string),
                language: term.language_tag().map(str::to_string),
            }),
            other => Err(JsonLdError::InvalidQuad {
                message: format!("{:?} cannot appear in object position", other),
            }),
        }
    }

    /// Node reference (IRI or blank node id), if this is one.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            NodeValue::Iri(id) | NodeValue::Blank(id) => Some(id),
            NodeValue::Literal { .. } => None,
        }
    }
}

/// All triples of one subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatNode {
    pub id: String,
    pub types: Vec<String>,
    pub properties: IndexMap<String, Vec<NodeValue>>,
}

impl FlatNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn add(&mut self, predicate: &str, value: NodeValue) {
        if predicate == rdf::TYPE {
            if let NodeValue::Iri(t) = value {
                if !self.types.contains(&t) {
                    self.types.push(t);
                }
                return;
            }
        }
        let values = self.properties.entry(predicate.to_string()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn has_type(&self, iri: &str) -> bool {
        self.types.iter().any(|t| t == iri)
    }

    /// Values of a predicate (empty when absent).
    pub fn values(&self, predicate: &str) -> &[NodeValue] {
        self.properties
            .get(predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Compact this node with a context.
    ///
    /// Every forward term of the context is looked up by its `@id`; values
    /// of predicates without a term are keyed by their vocab-compacted IRI.
    /// Terms with `@container: @set` always produce arrays, everything else
    /// produces a scalar for a single value.
    pub fn compact(&self, ctx: &ParsedContext, compactor: &ContextCompactor) -> Map<String, JsonValue> {
        let mut out = Map::new();
        out.insert(
            "@id".to_string(),
            JsonValue::String(compactor.compact_id(&self.id)),
        );

        let types: Vec<JsonValue> = self
            .types
            .iter()
            .map(|t| JsonValue::String(compactor.compact_vocab(t)))
            .collect();
        match types.len() {
            0 => {}
            1 => {
                out.insert("@type".to_string(), types[0].clone());
            }
            _ => {
                out.insert("@type".to_string(), JsonValue::Array(types));
            }
        }

        for (predicate, values) in &self.properties {
            let (key, entry) = match ctx.term_for(predicate) {
                Some((k, e)) => (k.to_string(), Some(e)),
                None => (compactor.compact_vocab(predicate), None),
            };
            let compacted: Vec<JsonValue> = values
                .iter()
                .map(|v| compact_value(v, entry, compactor))
                .collect();
            let always_array = entry
                .map(|e| matches!(e.container, Some(Container::Set) | Some(Container::List)))
                .unwrap_or(false);
            let value = if compacted.len() == 1 && !always_array {
                compacted.into_iter().next().unwrap_or(JsonValue::Null)
            } else {
                JsonValue::Array(compacted)
            };
            out.insert(key, value);
        }
        out
    }
}

fn compact_value(v: &NodeValue, entry: Option<&ContextEntry>, compactor: &ContextCompactor) -> JsonValue {
    let type_ = entry.and_then(|e| e.type_.as_ref());
    match v {
        NodeValue::Iri(id) | NodeValue::Blank(id) => match type_ {
            Some(TypeValue::Id) => JsonValue::String(compactor.compact_id(id)),
            Some(TypeValue::Vocab) => JsonValue::String(compactor.compact_vocab(id)),
            _ => {
                let mut obj = Map::new();
                obj.insert("@id".to_string(), JsonValue::String(compactor.compact_id(id)));
                JsonValue::Object(obj)
            }
        },
        NodeValue::Literal {
            value,
            datatype,
            language,
        } => {
            if let Some(lang) = language {
                let mut obj = Map::new();
                obj.insert("@value".to_string(), JsonValue::String(value.clone()));
                obj.insert("@language".to_string(), JsonValue::String(lang.clone()));
                return JsonValue::Object(obj);
            }
            let dt = datatype.as_deref().unwrap_or(xsd::STRING);
            let plain = dt == xsd::STRING
                || matches!(type_, Some(TypeValue::Iri(expected)) if expected == dt);
            if plain {
                JsonValue::String(value.clone())
            } else {
                let mut obj = Map::new();
                obj.insert("@value".to_string(), JsonValue::String(value.clone()));
                obj.insert(
                    "@type".to_string(),
                    JsonValue::String(compactor.compact_vocab(dt)),
                );
                JsonValue::Object(obj)
            }
        }
    }
}

fn blank_id(label: &str) -> String {
    if label.starts_with("_:") {
        label.to_string()
    } else {
        format!("_:{}", label)
    }
}

/// Subject id → flat node, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    nodes: IndexMap<String, FlatNode>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group quads by subject. Quads in named graphs are merged into one map.
    pub fn from_quads(quads: &[Quad]) -> Result<Self> {
        let mut map = NodeMap::new();
        for quad in quads {
            let subject = match quad.subject.term_type {
                TermType::NamedNode => quad.subject.value.clone(),
                TermType::BlankNode => blank_id(&quad.subject.value),
                other => {
                    return Err(JsonLdError::InvalidQuad {
                        message: format!("{:?} cannot appear in subject position", other),
                    })
                }
            };
            if quad.predicate.term_type != TermType::NamedNode {
                return Err(JsonLdError::InvalidQuad {
                    message: format!("predicate must be a named node: {}", quad.predicate.value),
                });
            }
            let value = NodeValue::from_term(&quad.object)?;
            map.nodes
                .entry(subject.clone())
                .or_insert_with(|| FlatNode::new(subject))
                .add(&quad.predicate.value, value);
        }
        Ok(map)
    }

    pub fn get(&self, id: &str) -> Option<&FlatNode> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
