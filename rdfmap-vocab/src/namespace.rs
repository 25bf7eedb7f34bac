//! Prefix → IRI stem map with abbreviation and expansion.
//!
//! Abbreviation always uses the longest stem that prefixes the IRI, so
//! `http://example.org/ns/sub#x` becomes `sub:x` rather than `ns:sub#x` when
//! both stems are registered. Both directions are total: anything that cannot
//! be rewritten is returned unchanged.

use crate::DEFAULT_PREFIXES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix → namespace stem mapping.
///
/// Serializes as a plain JSON object (`{"rdf": "http://...#", ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceMap {
    prefixes: BTreeMap<String, String>,
}

impl NamespaceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map holding the well-known prefixes (rdf, rdfs, xsd, owl, sh, dcterms).
    pub fn with_defaults() -> Self {
        DEFAULT_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect()
    }

    /// Register (or replace) a prefix.
    pub fn insert(&mut self, prefix: impl Into<String>, stem: impl Into<String>) {
        self.prefixes.insert(prefix.into(), stem.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_prefix(mut self, prefix: impl Into<String>, stem: impl Into<String>) -> Self {
        self.insert(prefix, stem);
        self
    }

    /// Copy every entry of `other` into this map, overriding duplicates.
    pub fn merge(&mut self, other: &NamespaceMap) {
        for (p, ns) in &other.prefixes {
            self.prefixes.insert(p.clone(), ns.clone());
        }
    }

    /// Stem registered for a prefix.
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Iterate `(prefix, stem)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Split an IRI into `(prefix, local)` using the longest matching stem.
    ///
    /// The local part is never empty and never starts with `//`, so the pair
    /// always expands back to the same IRI.
    pub fn split<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        let mut best: Option<(&str, &str)> = None;
        for (prefix, stem) in &self.prefixes {
            if stem.is_empty() || !iri.starts_with(stem.as_str()) {
                continue;
            }
            let local = &iri[stem.len()..];
            if local.is_empty() || local.starts_with("//") {
                continue;
            }
            let longer = match best {
                Some((_, best_local)) => local.len() < best_local.len(),
                None => true,
            };
            if longer {
                best = Some((prefix.as_str(), local));
            }
        }
        best
    }

    /// Shorten a full IRI to `prefix:local`, or return it unchanged.
    pub fn abbreviate(&self, iri: &str) -> String {
        match self.split(iri) {
            Some((prefix, local)) => format!("{}:{}", prefix, local),
            None => iri.to_string(),
        }
    }

    /// Expand `prefix:local` to a full IRI, or return the input unchanged.
    pub fn de_abbreviate(&self, s: &str) -> String {
        match parse_prefix(s) {
            Some((prefix, local)) => match self.get(prefix) {
                Some(stem) => format!("{}{}", stem, local),
                None => s.to_string(),
            },
            None => s.to_string(),
        }
    }
}

impl FromIterator<(String, String)> for NamespaceMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            prefixes: iter.into_iter().collect(),
        }
    }
}

/// Parse a compact IRI like `"schema:name"` into `(prefix, local)`.
///
/// Returns `None` for absolute IRIs (`http://...`), strings without a colon,
/// and an empty prefix.
pub fn parse_prefix(s: &str) -> Option<(&str, &str)> {
    let colon = s.find(':')?;
    let prefix = &s[..colon];
    let local = &s[colon + 1..];
    if prefix.is_empty() || prefix.contains('/') || local.starts_with("//") {
        return None;
    }
    Some((prefix, local))
}

/// Free-function form of [`NamespaceMap::abbreviate`].
pub fn abbreviate_iri(iri: &str, ns: &NamespaceMap) -> String {
    ns.abbreviate(iri)
}

/// Free-function form of [`NamespaceMap::de_abbreviate`].
pub fn de_abbreviate_iri(s: &str, ns: &NamespaceMap) -> String {
    ns.de_abbreviate(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> NamespaceMap {
        NamespaceMap::with_defaults()
            .with_prefix("ex", "http://example.org/")
            .with_prefix("exsub", "http://example.org/sub/")
            .with_prefix("rm", "http://cpgu.kbpm.ru/ns/rm/rdf#")
    }

    #[test]
    fn test_abbreviate_longest_stem_wins() {
        let ns = ns();
        assert_eq!(ns.abbreviate("http://example.org/sub/a"), "exsub:a");
        assert_eq!(ns.abbreviate("http://example.org/a"), "ex:a");
        assert_eq!(
            ns.abbreviate("http://cpgu.kbpm.ru/ns/rm/rdf#Artifact"),
            "rm:Artifact"
        );
    }

    #[test]
    fn test_abbreviate_unknown_is_unchanged() {
        let ns = ns();
        assert_eq!(
            ns.abbreviate("https://unknown.org/x"),
            "https://unknown.org/x"
        );
        // A bare stem has no local part to abbreviate
        assert_eq!(ns.abbreviate("http://example.org/"), "http://example.org/");
        assert_eq!(ns.abbreviate(""), "");
    }

    #[test]
    fn test_de_abbreviate() {
        let ns = ns();
        assert_eq!(ns.de_abbreviate("rdf:type"), crate::rdf::TYPE);
        assert_eq!(ns.de_abbreviate("unknown:type"), "unknown:type");
        assert_eq!(
            ns.de_abbreviate("http://example.org/x"),
            "http://example.org/x"
        );
        assert_eq!(ns.de_abbreviate("noColon"), "noColon");
    }

    #[test]
    fn test_round_trip_for_known_stems() {
        let ns = ns();
        for (_, stem) in ns.iter() {
            for local in ["a", "Thing", "x-y_z", "deep/path", "frag#ment"] {
                let iri = format!("{}{}", stem, local);
                assert_eq!(ns.de_abbreviate(&ns.abbreviate(&iri)), iri);
            }
        }
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("schema:name"), Some(("schema", "name")));
        assert_eq!(parse_prefix("urn:isbn:1"), Some(("urn", "isbn:1")));
        assert_eq!(parse_prefix("http://example.org"), None);
        assert_eq!(parse_prefix(":local"), None);
        assert_eq!(parse_prefix("nocolon"), None);
    }

    #[test]
    fn test_serde_as_plain_object() {
        let ns: NamespaceMap =
            serde_json::from_str(r#"{"ex": "http://example.org/"}"#).unwrap();
        assert_eq!(ns.get("ex"), Some("http://example.org/"));
        assert_eq!(
            serde_json::to_string(&ns).unwrap(),
            r#"{"ex":"http://example.org/"}"#
        );
    }
}
