//! JSON-Schema-shaped entity schemas.
//!
//! A schema describes one RDF class as a JSON object: `properties` carries
//! the JSON type of each key, `@context` maps each key to its predicate, and
//! `required` lists the keys every instance must have.
//!
//! ```json
//! {
//!   "@id": "rm:ArtifactShape",
//!   "targetClass": "rm:Artifact",
//!   "@context": {
//!     "identifier": {"@id": "dcterms:identifier", "@type": "xsd:integer"},
//!     "creator": {"@id": "dcterms:creator", "@type": "@id"}
//!   },
//!   "properties": {
//!     "@id": {"type": "string", "format": "iri"},
//!     "identifier": {"type": "integer"},
//!     "creator": {"type": "string", "format": "iri"}
//!   },
//!   "required": ["@id", "identifier"]
//! }
//! ```

use indexmap::IndexMap;
use rdfmap_vocab::NamespaceMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Value kind of a schema property, decoded once from `(type, format)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// `format: "iri"`
    Iri,
    /// `format: "date-time"`
    DateTime,
    Integer,
    Number,
    Boolean,
    String,
    /// Nested object, referenced by IRI in the store
    Object,
    Array(Box<ValueKind>),
}

impl ValueKind {
    pub fn is_array(&self) -> bool {
        matches!(self, ValueKind::Array(_))
    }

    /// Values are node references rather than literals.
    pub fn is_reference(&self) -> bool {
        matches!(self.element(), ValueKind::Iri | ValueKind::Object)
    }

    /// Element kind of an array, or the kind itself.
    pub fn element(&self) -> &ValueKind {
        match self {
            ValueKind::Array(inner) => inner.element(),
            other => other,
        }
    }
}

/// One entry of `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_modifiability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_modifiability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
}

impl PropertySchema {
    pub fn of_type(type_: &str) -> Self {
        Self {
            type_: Some(type_.to_string()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn kind(&self) -> ValueKind {
        match (self.type_.as_deref(), self.format.as_deref()) {
            (Some("array"), _) => ValueKind::Array(Box::new(
                self.items
                    .as_ref()
                    .map(|items| items.kind())
                    .unwrap_or(ValueKind::String),
            )),
            (_, Some("iri")) => ValueKind::Iri,
            (_, Some("date-time")) => ValueKind::DateTime,
            (Some("integer"), _) => ValueKind::Integer,
            (Some("number"), _) => ValueKind::Number,
            (Some("boolean"), _) => ValueKind::Boolean,
            (Some("object"), _) => ValueKind::Object,
            _ => ValueKind::String,
        }
    }
}

/// Predicate a property is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Expanded predicate IRI
    pub iri: String,
    /// `@reverse` mapping: the entity is the object of the triple
    pub reverse: bool,
}

/// A resolved entity schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
    #[serde(rename = "@context", default)]
    pub context: Map<String, JsonValue>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl EntitySchema {
    pub fn property(&self, key: &str) -> Option<&PropertySchema> {
        self.properties.get(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    /// Kind of a key; `@id` and `@type` are always IRIs, unknown keys strings.
    pub fn kind_of(&self, key: &str) -> ValueKind {
        match key {
            "@id" | "@type" => ValueKind::Iri,
            _ => self
                .properties
                .get(key)
                .map(PropertySchema::kind)
                .unwrap_or(ValueKind::String),
        }
    }

    /// Predicate of `key` from `@context`, de-abbreviated.
    ///
    /// Accepts a bare string, `{"@id": ..}` or `{"@reverse": ..}`.
    pub fn predicate(&self, key: &str, ns: &NamespaceMap) -> Option<Predicate> {
        match self.context.get(key)? {
            JsonValue::String(iri) => Some(Predicate {
                iri: ns.de_abbreviate(iri),
                reverse: false,
            }),
            JsonValue::Object(def) => {
                if let Some(iri) = def.get("@reverse").and_then(JsonValue::as_str) {
                    return Some(Predicate {
                        iri: ns.de_abbreviate(iri),
                        reverse: true,
                    });
                }
                def.get("@id").and_then(JsonValue::as_str).map(|iri| Predicate {
                    iri: ns.de_abbreviate(iri),
                    reverse: false,
                })
            }
            _ => None,
        }
    }

    /// Expanded target class.
    pub fn target_class_iri(&self, ns: &NamespaceMap) -> Option<String> {
        self.target_class.as_deref().map(|c| ns.de_abbreviate(c))
    }
}
