use crate::context::ParsedContext;
use crate::iri;
use std::collections::HashMap;

/// A precomputed lookup table for IRI compaction.
///
/// Namespace IRI entries are sorted longest-first so the most specific
/// prefix always wins (e.g. `http://example.org/sub/` before
/// `http://example.org/`).
///
/// Build once from a `ParsedContext`, then call `compact_vocab()` or
/// `compact_id()` for each IRI.
#[derive(Debug, Clone)]
pub struct ContextCompactor {
    /// Full IRI → term (exact matches like `dcterms:title` → `title`)
    exact: HashMap<String, String>,
    /// Namespace IRIs (ending in `/` or `#`) paired with their prefix,
    /// sorted longest-first for greedy matching.
    prefixes: Vec<(String, String)>,
    vocab: Option<String>,
}

impl ContextCompactor {
    /// Build a compactor from a parsed JSON-LD context.
    pub fn new(context: &ParsedContext) -> Self {
        let mut exact = HashMap::new();
        for (term, entry) in &context.terms {
            if entry.is_reverse() {
                continue;
            }
            if let Some(ref id) = entry.id {
                // First definition wins
                exact.entry(id.clone()).or_insert_with(|| term.clone());
            }
        }

        let mut prefixes: Vec<(String, String)> = exact
            .iter()
            .filter(|(id, _)| iri::is_namespace(id))
            .map(|(id, term)| (id.clone(), term.clone()))
            .collect();
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.1.cmp(&b.1)));

        Self {
            exact,
            prefixes,
            vocab: context.vocab.clone(),
        }
    }

    /// Compact an IRI using @vocab rules (for property names, @type values).
    ///
    /// Tries exact match first, then longest-prefix match, then `@vocab`.
    pub fn compact_vocab(&self, iri: &str) -> String {
        if let Some(term) = self.exact.get(iri) {
            if !iri::is_namespace(iri) {
                return term.clone();
            }
        }
        if let Some(compact) = self.compact_prefixed(iri) {
            return compact;
        }
        if let Some(ref v) = self.vocab {
            if let Some(local) = iri.strip_prefix(v.as_str()) {
                if !local.is_empty() {
                    return local.to_string();
                }
            }
        }
        iri.to_string()
    }

    /// Compact an IRI for an `@id` position.
    ///
    /// Only prefix terms participate; term names and `@vocab` never shorten
    /// node identifiers.
    pub fn compact_id(&self, iri: &str) -> String {
        self.compact_prefixed(iri)
            .unwrap_or_else(|| iri.to_string())
    }

    fn compact_prefixed(&self, iri: &str) -> Option<String> {
        for (stem, prefix) in &self.prefixes {
            if let Some(local) = iri.strip_prefix(stem.as_str()) {
                if local.is_empty() || local.starts_with("//") {
                    continue;
                }
                return Some(format!("{}:{}", prefix, local));
            }
        }
        None
    }
}
