//! RDF/JS-shaped quads as returned by CONSTRUCT queries.
//!
//! ```json
//! {
//!   "subject":   {"termType": "NamedNode", "value": "http://example.org/a"},
//!   "predicate": {"termType": "NamedNode", "value": "http://example.org/p"},
//!   "object":    {"termType": "Literal", "value": "3",
//!                 "datatype": {"termType": "NamedNode", "value": "http://www.w3.org/2001/XMLSchema#integer"}}
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermType {
    NamedNode,
    BlankNode,
    Literal,
    DefaultGraph,
    Variable,
}

/// Datatype reference of a literal (`{"termType": "NamedNode", "value": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedNodeRef {
    #[serde(default = "named_node")]
    pub term_type: TermType,
    pub value: String,
}

fn named_node() -> TermType {
    TermType::NamedNode
}

/// One position of a quad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadTerm {
    pub term_type: TermType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<NamedNodeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl QuadTerm {
    pub fn named(iri: impl Into<String>) -> Self {
        Self {
            term_type: TermType::NamedNode,
            value: iri.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self {
            term_type: TermType::BlankNode,
            value: label.into(),
            datatype: None,
            language: None,
        }
    }

    /// A literal, optionally typed with an expanded datatype IRI.
    pub fn literal(value: impl Into<String>, datatype: Option<&str>) -> Self {
        Self {
            term_type: TermType::Literal,
            value: value.into(),
            datatype: datatype.map(|dt| NamedNodeRef {
                term_type: TermType::NamedNode,
                value: dt.to_string(),
            }),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            term_type: TermType::Literal,
            value: value.into(),
            datatype: Some(NamedNodeRef {
                term_type: TermType::NamedNode,
                value: rdfmap_vocab::rdf::LANG_STRING.to_string(),
            }),
            language: Some(lang.into()),
        }
    }

    /// Datatype IRI, if any.
    pub fn datatype_iri(&self) -> Option<&str> {
        self.datatype.as_ref().map(|d| d.value.as_str())
    }

    /// Language tag, treating the RDF/JS empty string as absent.
    pub fn language_tag(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    pub subject: QuadTerm,
    pub predicate: QuadTerm,
    pub object: QuadTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<QuadTerm>,
}

impl Quad {
    pub fn new(subject: QuadTerm, predicate: QuadTerm, object: QuadTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_rdfjs_quad() {
        let q: Quad = serde_json::from_value(json!({
            "subject": {"termType": "NamedNode", "value": "http://example.org/a"},
            "predicate": {"termType": "NamedNode", "value": "http://example.org/p"},
            "object": {
                "termType": "Literal",
                "value": "3",
                "language": "",
                "datatype": {"termType": "NamedNode", "value": "http://www.w3.org/2001/XMLSchema#integer"}
            },
            "graph": {"termType": "DefaultGraph", "value": ""}
        }))
        .unwrap();
        assert_eq!(q.object.datatype_iri(), Some(rdfmap_vocab::xsd::INTEGER));
        assert_eq!(q.object.language_tag(), None);
        assert_eq!(q.graph.unwrap().term_type, TermType::DefaultGraph);
    }
}
