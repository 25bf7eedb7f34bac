use crate::error::{JsonLdError, Result};
use crate::iri;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

/// Container types for JSON-LD @container values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    List,
    Set,
    Language,
    Index,
}

impl Container {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            "@language" => Some(Container::Language),
            "@index" => Some(Container::Index),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Container::List => "@list",
            Container::Set => "@set",
            Container::Language => "@language",
            Container::Index => "@index",
        }
    }
}

/// Type values can be keywords or IRIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    Id,          // @id - value is an IRI reference
    Vocab,       // @vocab
    Json,        // @json - JSON literal
    Iri(String), // Specific datatype IRI
}

/// A single context entry (term definition)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextEntry {
    /// The expanded IRI (@id)
    pub id: Option<String>,
    /// The datatype (@type)
    pub type_: Option<TypeValue>,
    /// Reverse property (@reverse)
    pub reverse: Option<String>,
    /// Container type (@container)
    pub container: Option<Container>,
    /// Nested context for this term (@context)
    pub context: Option<Box<ParsedContext>>,
}

impl ContextEntry {
    /// A plain `term -> IRI` mapping.
    pub fn iri(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_: TypeValue) -> Self {
        self.type_ = Some(type_);
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_context(mut self, context: ParsedContext) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Check whether this term maps a reverse property.
    pub fn is_reverse(&self) -> bool {
        self.reverse.is_some()
    }

    /// Serialize this entry to a JSON-LD value.
    ///
    /// Returns a simple string if only `@id` is set, otherwise an object.
    pub fn to_json(&self) -> JsonValue {
        let has_extras = self.type_.is_some()
            || self.reverse.is_some()
            || self.container.is_some()
            || self.context.is_some();

        if !has_extras {
            if let Some(ref id) = self.id {
                return JsonValue::String(id.clone());
            }
            return JsonValue::Null;
        }

        let mut obj = Map::new();

        if let Some(ref id) = self.id {
            obj.insert("@id".to_string(), JsonValue::String(id.clone()));
        }
        if let Some(ref rev) = self.reverse {
            obj.insert("@reverse".to_string(), JsonValue::String(rev.clone()));
        }
        if let Some(ref t) = self.type_ {
            let type_str = match t {
                TypeValue::Id => "@id".to_string(),
                TypeValue::Vocab => "@vocab".to_string(),
                TypeValue::Json => "@json".to_string(),
                TypeValue::Iri(iri) => iri.clone(),
            };
            obj.insert("@type".to_string(), JsonValue::String(type_str));
        }
        if let Some(c) = self.container {
            obj.insert(
                "@container".to_string(),
                JsonValue::String(c.as_str().to_string()),
            );
        }
        if let Some(ref nested) = self.context {
            obj.insert("@context".to_string(), nested.to_json());
        }

        JsonValue::Object(obj)
    }
}

/// The fully parsed context
///
/// Terms keep their definition order so serialization and reverse lookups
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContext {
    /// Default vocabulary (@vocab)
    pub vocab: Option<String>,
    /// Base IRI (@base)
    pub base: Option<String>,
    /// Term definitions
    pub terms: IndexMap<String, ContextEntry>,
}

impl ParsedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a term entry by key
    pub fn get(&self, key: &str) -> Option<&ContextEntry> {
        self.terms.get(key)
    }

    /// Mutable access to a term entry
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ContextEntry> {
        self.terms.get_mut(key)
    }

    /// Check if context contains a term
    pub fn contains(&self, key: &str) -> bool {
        self.terms.contains_key(key)
    }

    /// Define (or replace) a term.
    pub fn insert(&mut self, key: impl Into<String>, entry: ContextEntry) {
        self.terms.insert(key.into(), entry);
    }

    /// Remove a term definition.
    pub fn remove(&mut self, key: &str) -> Option<ContextEntry> {
        self.terms.shift_remove(key)
    }

    /// Expand a term or compact IRI (`vocab` semantics).
    pub fn expand(&self, value: &str) -> String {
        iri::expand_iri(value, self, true)
    }

    /// Find the first non-reverse term whose `@id` is exactly `iri`.
    pub fn term_for(&self, iri: &str) -> Option<(&str, &ContextEntry)> {
        self.terms
            .iter()
            .find(|(_, e)| !e.is_reverse() && e.id.as_deref() == Some(iri))
            .map(|(k, e)| (k.as_str(), e))
    }

    /// Find the first term declaring `@reverse` of `iri`.
    pub fn reverse_term_for(&self, iri: &str) -> Option<(&str, &ContextEntry)> {
        self.terms
            .iter()
            .find(|(_, e)| e.reverse.as_deref() == Some(iri))
            .map(|(k, e)| (k.as_str(), e))
    }

    /// Serialize this ParsedContext back to a JSON-LD @context value.
    ///
    /// Returns `JsonValue::Null` for empty contexts.
    pub fn to_json(&self) -> JsonValue {
        if self.terms.is_empty() && self.vocab.is_none() && self.base.is_none() {
            return JsonValue::Null;
        }

        let mut ctx = Map::new();

        if let Some(ref vocab) = self.vocab {
            ctx.insert("@vocab".to_string(), JsonValue::String(vocab.clone()));
        }
        if let Some(ref base) = self.base {
            ctx.insert("@base".to_string(), JsonValue::String(base.clone()));
        }
        for (key, entry) in &self.terms {
            ctx.insert(key.clone(), entry.to_json());
        }

        JsonValue::Object(ctx)
    }

    /// Parse a JSON-LD context value (map, array, or null)
    pub fn parse(base_context: Option<&ParsedContext>, context: &JsonValue) -> Result<ParsedContext> {
        let active = base_context.cloned().unwrap_or_default();

        match context {
            JsonValue::Null => Ok(ParsedContext::default()), // null resets context

            JsonValue::Object(map) => {
                // Check for wrapped @context
                if let Some(inner) = map.get("@context") {
                    return Self::parse(Some(&active), inner);
                }
                parse_context_map(&active, map)
            }

            JsonValue::Array(arr) => {
                // Sequential contexts: process in order
                let mut active = active;
                for ctx in arr {
                    active = Self::parse(Some(&active), ctx)?;
                }
                Ok(active)
            }

            _ => Err(JsonLdError::InvalidContext {
                message: format!("Invalid context type: {:?}", context),
            }),
        }
    }
}

/// Parse a context object (map)
fn parse_context_map(base: &ParsedContext, map: &Map<String, JsonValue>) -> Result<ParsedContext> {
    let mut result = base.clone();

    // First pass: extract @-prefixed keys
    for (key, value) in map.iter() {
        match key.as_str() {
            "@vocab" => {
                result.vocab = match value {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Null => None,
                    _ => {
                        return Err(JsonLdError::InvalidContext {
                            message: format!("@vocab must be a string, got: {:?}", value),
                        })
                    }
                };
            }
            "@base" => {
                result.base = value.as_str().map(|s| s.to_string());
            }
            _ => {} // Ignore other @-keywords
        }
    }

    let vocab = result.vocab.clone();

    // Second pass: parse term definitions
    for (key, value) in map.iter() {
        if key.starts_with('@') {
            continue;
        }
        if value.is_null() {
            result.terms.shift_remove(key);
            continue;
        }
        let entry = parse_context_entry(key, value, map, base, vocab.as_deref())?;
        result.terms.insert(key.clone(), entry);
    }

    // Scoped contexts see every term defined at this level
    for (key, value) in map.iter() {
        if let Some(nested) = value.get("@context") {
            let scope = result.clone();
            let parsed = ParsedContext::parse(Some(&scope), nested)?;
            if let Some(entry) = result.terms.get_mut(key) {
                entry.context = Some(Box::new(parsed));
            }
        }
    }

    Ok(result)
}

fn parse_context_entry(
    key: &str,
    value: &JsonValue,
    map: &Map<String, JsonValue>,
    base: &ParsedContext,
    vocab: Option<&str>,
) -> Result<ContextEntry> {
    let resolve = |s: &str| -> Result<String> {
        let mut visited = Vec::new();
        resolve_iri(s, map, base, vocab, &mut visited)
    };

    match value {
        JsonValue::String(s) => Ok(ContextEntry::iri(resolve(s)?)),
        JsonValue::Object(def) => {
            let mut entry = ContextEntry::default();

            if let Some(JsonValue::String(rev)) = def.get("@reverse") {
                entry.reverse = Some(resolve(rev)?);
            }
            match def.get("@id") {
                Some(JsonValue::String(id)) => entry.id = Some(resolve(id)?),
                Some(_) => {
                    return Err(JsonLdError::InvalidIriMapping {
                        term: key.to_string(),
                        context: JsonValue::Object(map.clone()),
                    })
                }
                None if entry.reverse.is_none() => {
                    // Term without @id maps to itself when it is an IRI or resolvable through @vocab
                    let implied = resolve(key)?;
                    if implied != key || iri::is_absolute(key) {
                        entry.id = Some(implied);
                    }
                }
                None => {}
            }
            if let Some(JsonValue::String(t)) = def.get("@type") {
                entry.type_ = Some(match t.as_str() {
                    "@id" => TypeValue::Id,
                    "@vocab" => TypeValue::Vocab,
                    "@json" => TypeValue::Json,
                    other => TypeValue::Iri(resolve(other)?),
                });
            }
            entry.container = match def.get("@container") {
                Some(JsonValue::String(c)) => Container::parse(c),
                Some(JsonValue::Array(cs)) => cs
                    .iter()
                    .filter_map(|c| c.as_str())
                    .find_map(Container::parse),
                _ => None,
            };
            Ok(entry)
        }
        _ => Err(JsonLdError::InvalidIriMapping {
            term: key.to_string(),
            context: JsonValue::Object(map.clone()),
        }),
    }
}

/// Resolve a term value against the context being defined, then the base context.
fn resolve_iri(
    value: &str,
    map: &Map<String, JsonValue>,
    base: &ParsedContext,
    vocab: Option<&str>,
    visited: &mut Vec<String>,
) -> Result<String> {
    if value.starts_with('@') {
        return Ok(value.to_string());
    }
    if visited.iter().any(|v| v == value) {
        return Err(JsonLdError::InvalidIriMapping {
            term: value.to_string(),
            context: JsonValue::Object(map.clone()),
        });
    }

    if let Some((prefix, local)) = iri::parse_prefix(value) {
        if let Some(stem) = local_definition(prefix, map) {
            visited.push(value.to_string());
            let stem = resolve_iri(stem, map, base, vocab, visited)?;
            return Ok(format!("{}{}", stem, local));
        }
        if let Some(stem) = base.get(prefix).and_then(|e| e.id.as_deref()) {
            return Ok(format!("{}{}", stem, local));
        }
        return Ok(value.to_string());
    }

    if iri::is_absolute(value) {
        return Ok(value.to_string());
    }
    if let Some(target) = local_definition(value, map) {
        if target != value {
            visited.push(value.to_string());
            return resolve_iri(target, map, base, vocab, visited);
        }
    }
    if let Some(id) = base.get(value).and_then(|e| e.id.as_deref()) {
        return Ok(id.to_string());
    }
    match vocab {
        Some(v) => Ok(format!("{}{}", v, value)),
        None => Ok(value.to_string()),
    }
}

/// The raw `@id` a term is given in the context map being parsed.
fn local_definition<'a>(term: &str, map: &'a Map<String, JsonValue>) -> Option<&'a str> {
    match map.get(term)? {
        JsonValue::String(s) => Some(s.as_str()),
        JsonValue::Object(def) => def.get("@id").and_then(|v| v.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_and_term_resolution() {
        let ctx = ParsedContext::parse(
            None,
            &json!({
                "dcterms": "http://purl.org/dc/terms/",
                "xsd": "http://www.w3.org/2001/XMLSchema#",
                "title": "dcterms:title",
                "identifier": {"@id": "dcterms:identifier", "@type": "xsd:integer"},
                "creator": {"@id": "dcterms:creator", "@type": "@id"}
            }),
        )
        .unwrap();

        assert_eq!(
            ctx.get("title").unwrap().id.as_deref(),
            Some("http://purl.org/dc/terms/title")
        );
        assert_eq!(
            ctx.get("identifier").unwrap().type_,
            Some(TypeValue::Iri(
                "http://www.w3.org/2001/XMLSchema#integer".to_string()
            ))
        );
        assert_eq!(ctx.get("creator").unwrap().type_, Some(TypeValue::Id));
    }

    #[test]
    fn test_prefix_from_base_context() {
        let base = ParsedContext::parse(None, &json!({"ex": "http://example.org/"})).unwrap();
        let ctx = ParsedContext::parse(Some(&base), &json!({"name": "ex:name"})).unwrap();
        assert_eq!(
            ctx.get("name").unwrap().id.as_deref(),
            Some("http://example.org/name")
        );
        assert!(ctx.contains("ex"));
    }

    #[test]
    fn test_reverse_and_nested_context() {
        let ctx = ParsedContext::parse(
            None,
            &json!({
                "ex": "http://example.org/",
                "parts": {
                    "@reverse": "ex:partOf",
                    "@context": {"label": "ex:label"}
                }
            }),
        )
        .unwrap();
        let parts = ctx.get("parts").unwrap();
        assert_eq!(parts.reverse.as_deref(), Some("http://example.org/partOf"));
        assert!(parts.id.is_none());
        let nested = parts.context.as_ref().unwrap();
        assert_eq!(
            nested.get("label").unwrap().id.as_deref(),
            Some("http://example.org/label")
        );
        assert_eq!(
            ctx.reverse_term_for("http://example.org/partOf").map(|(k, _)| k),
            Some("parts")
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = ParsedContext::parse(None, &json!({"a": "b", "b": "a"}));
        assert!(matches!(err, Err(JsonLdError::InvalidIriMapping { .. })));
    }

    #[test]
    fn test_null_resets_term() {
        let base = ParsedContext::parse(None, &json!({"ex": "http://example.org/"})).unwrap();
        let ctx = ParsedContext::parse(Some(&base), &json!({"ex": null})).unwrap();
        assert!(!ctx.contains("ex"));
    }

    #[test]
    fn test_round_trip_to_json() {
        let input = json!({
            "ex": "http://example.org/",
            "knows": {"@id": "http://example.org/knows", "@type": "@id", "@container": "@set"}
        });
        let ctx = ParsedContext::parse(None, &input).unwrap();
        assert_eq!(ctx.to_json(), input);
    }
}
