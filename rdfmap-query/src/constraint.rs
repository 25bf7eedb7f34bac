//! Entity and collection constraints.
//!
//! The wire shapes ([`EntConstrJson`], [`CollConstrJson`]) deserialize the
//! caller's JSON as-is. [`CollConstr::build`] turns them into owned,
//! validated constraints: schema references are resolved, conditions are
//! parsed into [`Condition`] values, and keys no schema knows are dropped.
//! The caller's input is never modified.

use crate::client::SchemaProvider;
use crate::config::CompilerConfig;
use crate::error::{QueryError, Result};
use crate::schema::EntitySchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

// ============================================================================
// Wire shapes
// ============================================================================

/// Schema given inline or by IRI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Iri(String),
    Inline(Box<EntitySchema>),
}

/// `variables`: object keys or a list of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariablesJson {
    Keys(Vec<String>),
    Object(Map<String, JsonValue>),
}

impl VariablesJson {
    fn keys(&self) -> Vec<String> {
        match self {
            VariablesJson::Keys(keys) => keys.clone(),
            VariablesJson::Object(map) => map.keys().cloned().collect(),
        }
    }
}

/// One `orderBy` entry: a key, or `{key, desc}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderKeyJson {
    Key(String),
    Spec {
        key: String,
        #[serde(default)]
        desc: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderByJson {
    One(OrderKeyJson),
    Many(Vec<OrderKeyJson>),
}

impl OrderByJson {
    fn to_keys(&self) -> Vec<OrderKey> {
        let one = |k: &OrderKeyJson| match k {
            OrderKeyJson::Key(key) => OrderKey::asc(key),
            OrderKeyJson::Spec { key, desc } => OrderKey {
                key: key.clone(),
                desc: *desc,
            },
        };
        match self {
            OrderByJson::One(k) => vec![one(k)],
            OrderByJson::Many(ks) => ks.iter().map(one).collect(),
        }
    }
}

/// Entity constraint as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntConstrJson {
    pub schema: SchemaRef,
    #[serde(default)]
    pub conditions: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<VariablesJson>,
    #[serde(default)]
    pub data: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_type: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderByJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Collection constraint as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollConstrJson {
    #[serde(rename = "@id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub ent_constrs: Vec<EntConstrJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderByJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    #[serde(default)]
    pub options: Map<String, JsonValue>,
}

// ============================================================================
// Conditions
// ============================================================================

/// Comparison vocabulary of `{relation, value}` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    After,
    Before,
    Between,
    Any,
    NotAny,
    Contains,
    NotContains,
    StartWith,
    EndWith,
    RegEx,
    Exist,
    NotExist,
}

impl Relation {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "equal" => Relation::Equal,
            "notEqual" => Relation::NotEqual,
            "after" => Relation::After,
            "before" => Relation::Before,
            "between" => Relation::Between,
            "any" => Relation::Any,
            "notAny" => Relation::NotAny,
            "contains" => Relation::Contains,
            "notContains" => Relation::NotContains,
            "startWith" => Relation::StartWith,
            "endWith" => Relation::EndWith,
            "regEx" => Relation::RegEx,
            "exist" => Relation::Exist,
            "notExist" => Relation::NotExist,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Equal => "equal",
            Relation::NotEqual => "notEqual",
            Relation::After => "after",
            Relation::Before => "before",
            Relation::Between => "between",
            Relation::Any => "any",
            Relation::NotAny => "notAny",
            Relation::Contains => "contains",
            Relation::NotContains => "notContains",
            Relation::StartWith => "startWith",
            Relation::EndWith => "endWith",
            Relation::RegEx => "regEx",
            Relation::Exist => "exist",
            Relation::NotExist => "notExist",
        }
    }

    /// Existence tests do not need a value and do not narrow the property.
    pub fn is_existence(&self) -> bool {
        matches!(self, Relation::Exist | Relation::NotExist)
    }
}

/// Relation of a `{bind: {...}}` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindRelation {
    Exists,
    NotExists,
}

/// One `{subject, predicate, object}` of a bind condition.
///
/// `?x` marks a variable; anything else is a (compact) IRI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindTriple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Parsed value of `conditions[key]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Plain scalar or IRI: equality
    Value(JsonValue),
    /// `"?name"`: shared variable with another entity
    VarRef(String),
    Relation {
        relation: Relation,
        values: Vec<JsonValue>,
    },
    Bind {
        relation: BindRelation,
        triples: Vec<BindTriple>,
    },
}

impl Condition {
    /// Parse one condition of entity `entity`.
    pub fn parse(entity: usize, key: &str, value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Err(QueryError::malformed(entity, key, "null condition")),
            JsonValue::String(s) if s.len() > 1 && s.starts_with('?') => {
                Ok(Condition::VarRef(s[1..].to_string()))
            }
            JsonValue::Array(values) => Ok(Condition::Relation {
                relation: Relation::Any,
                values: values.clone(),
            }),
            JsonValue::Object(obj) if obj.contains_key("bind") => parse_bind(entity, key, &obj["bind"]),
            JsonValue::Object(obj) if obj.contains_key("relation") => {
                let name = obj["relation"].as_str().unwrap_or_default();
                let relation = Relation::parse(name).ok_or_else(|| {
                    QueryError::malformed(entity, key, format!("unknown relation '{}'", name))
                })?;
                let values = match obj.get("value") {
                    Some(JsonValue::Array(vs)) => vs.clone(),
                    Some(JsonValue::Null) | None => Vec::new(),
                    Some(v) => vec![v.clone()],
                };
                if values.is_empty() && !relation.is_existence() {
                    return Err(QueryError::malformed(
                        entity,
                        key,
                        format!("relation '{}' needs a value", name),
                    ));
                }
                if relation == Relation::Between && values.len() != 2 {
                    return Err(QueryError::malformed(
                        entity,
                        key,
                        "relation 'between' needs exactly two values",
                    ));
                }
                Ok(Condition::Relation { relation, values })
            }
            other => Ok(Condition::Value(other.clone())),
        }
    }

    /// Whether the condition restricts the property to a subset of values.
    pub fn narrows(&self) -> bool {
        match self {
            Condition::Value(_) | Condition::VarRef(_) => true,
            Condition::Relation { relation, .. } => !relation.is_existence(),
            Condition::Bind { .. } => false,
        }
    }

    pub fn as_var_ref(&self) -> Option<&str> {
        match self {
            Condition::VarRef(name) => Some(name),
            _ => None,
        }
    }
}

fn parse_bind(entity: usize, key: &str, bind: &JsonValue) -> Result<Condition> {
    let relation = match bind.get("relation").and_then(JsonValue::as_str) {
        Some("exists") | Some("exist") => BindRelation::Exists,
        Some("notExists") | Some("notExist") => BindRelation::NotExists,
        other => {
            return Err(QueryError::malformed(
                entity,
                key,
                format!("unknown bind relation {:?}", other),
            ))
        }
    };
    let triples = match bind.get("triples") {
        Some(t) => serde_json::from_value::<Vec<BindTriple>>(t.clone())
            .map_err(|e| QueryError::malformed(entity, key, format!("bad bind triples: {}", e)))?,
        None => Vec::new(),
    };
    Ok(Condition::Bind { relation, triples })
}

// ============================================================================
// Owned constraints
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    /// Property key, or `?var` for a raw variable
    pub key: String,
    pub desc: bool,
}

impl OrderKey {
    pub fn asc(key: &str) -> Self {
        Self {
            key: key.to_string(),
            desc: false,
        }
    }

    pub fn desc(key: &str) -> Self {
        Self {
            key: key.to_string(),
            desc: true,
        }
    }
}

/// A validated entity constraint with its resolved schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EntConstr {
    /// Position in the collection (0 = root)
    pub index: usize,
    pub schema: EntitySchema,
    pub conditions: IndexMap<String, Condition>,
    /// `None` selects every schema key; `Some(vec![])` selects none
    pub variables: Option<Vec<String>>,
    pub data: Map<String, JsonValue>,
    pub resolve_type: bool,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    pub service: Option<String>,
}

impl EntConstr {
    /// Constraint over `schema` with nothing but defaults set.
    pub fn new(index: usize, schema: EntitySchema) -> Self {
        Self {
            index,
            schema,
            conditions: IndexMap::new(),
            variables: None,
            data: Map::new(),
            resolve_type: false,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            service: None,
        }
    }

    pub fn with_condition(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(key.into(), condition);
        self
    }

    pub fn condition(&self, key: &str) -> Option<&Condition> {
        self.conditions.get(key)
    }

    /// Carries its own ORDER BY, LIMIT or OFFSET.
    pub fn is_shaped(&self) -> bool {
        self.limit.is_some() || self.offset.is_some() || !self.order_by.is_empty()
    }

    /// Keys this entity understands: schema properties, `@id`, `@type`.
    pub(crate) fn knows(&self, key: &str) -> bool {
        key == "@id" || key == "@type" || self.schema.has_property(key)
    }

    fn from_json<P: SchemaProvider + ?Sized>(
        index: usize,
        json: &EntConstrJson,
        schemas: &P,
        config: &CompilerConfig,
    ) -> Result<Self> {
        let schema = match &json.schema {
            SchemaRef::Inline(schema) => (**schema).clone(),
            SchemaRef::Iri(iri) => schemas
                .get(iri)
                .ok_or_else(|| QueryError::SchemaUnresolved { iri: iri.clone() })?,
        };
        let mut conditions = IndexMap::new();
        for (key, value) in &json.conditions {
            conditions.insert(key.clone(), Condition::parse(index, key, value)?);
        }
        Ok(Self {
            index,
            schema,
            conditions,
            variables: json.variables.as_ref().map(VariablesJson::keys),
            data: json.data.clone(),
            resolve_type: json.resolve_type.unwrap_or(config.default_resolve_type),
            order_by: json.order_by.as_ref().map(OrderByJson::to_keys).unwrap_or_default(),
            limit: json.limit,
            offset: json.offset,
            distinct: json.distinct.unwrap_or(false),
            service: json.service.clone(),
        })
    }
}

/// A validated collection: position 0 is the root entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CollConstr {
    pub id: Option<String>,
    pub entities: Vec<EntConstr>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    /// Passed to the client untouched
    pub options: Map<String, JsonValue>,
}

impl CollConstr {
    /// Single-entity collection with default query shaping.
    pub fn single(entity: EntConstr) -> Self {
        Self {
            id: None,
            entities: vec![entity],
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            options: Map::new(),
        }
    }

    pub fn root(&self) -> Option<&EntConstr> {
        self.entities.first()
    }

    /// Label used in errors and spans.
    pub fn label(&self) -> String {
        match (&self.id, self.root()) {
            (Some(id), _) => id.clone(),
            (None, Some(root)) => root.schema.id.clone(),
            (None, None) => String::new(),
        }
    }

    /// Resolve schemas and parse conditions.
    ///
    /// Condition and data keys no schema of the collection declares are
    /// dropped, or rejected with `UnknownPropertyReference` in strict mode.
    /// Bind conditions introduce their own key and are always kept.
    pub fn build<P: SchemaProvider + ?Sized>(
        json: &CollConstrJson,
        schemas: &P,
        config: &CompilerConfig,
    ) -> Result<Self> {
        let mut entities = json
            .ent_constrs
            .iter()
            .enumerate()
            .map(|(i, e)| EntConstr::from_json(i, e, schemas, config))
            .collect::<Result<Vec<_>>>()?;

        let known_anywhere = |key: &str, entities: &[EntConstr]| entities.iter().any(|e| e.knows(key));
        for i in 0..entities.len() {
            let unknown: Vec<String> = entities[i]
                .conditions
                .iter()
                .filter(|(k, c)| !matches!(c, Condition::Bind { .. }) && !entities[i].knows(k))
                .map(|(k, _)| k.clone())
                .chain(
                    entities[i]
                        .data
                        .keys()
                        .filter(|k| !entities[i].knows(k))
                        .cloned(),
                )
                .collect();
            for key in unknown {
                if config.strict_properties && !known_anywhere(&key, &entities) {
                    return Err(QueryError::UnknownPropertyReference { entity: i, key });
                }
                tracing::trace!(entity = i, key = %key, "dropping unknown property");
                entities[i].conditions.shift_remove(&key);
                entities[i].data.remove(&key);
            }
        }

        Ok(Self {
            id: json.id.clone(),
            entities,
            order_by: json.order_by.as_ref().map(OrderByJson::to_keys).unwrap_or_default(),
            limit: json.limit,
            offset: json.offset,
            distinct: json.distinct.unwrap_or(false),
            options: json.options.clone(),
        })
    }

    /// Parse the wire JSON and build.
    pub fn from_value<P: SchemaProvider + ?Sized>(
        value: &JsonValue,
        schemas: &P,
        config: &CompilerConfig,
    ) -> Result<Self> {
        let json: CollConstrJson = serde_json::from_value(value.clone())?;
        Self::build(&json, schemas, config)
    }
}
