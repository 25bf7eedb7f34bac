use crate::context::ParsedContext;

pub use rdfmap_vocab::parse_prefix;

/// Returns true if the IRI is absolute (has an RFC 3986 scheme).
///
/// An absolute IRI starts with a scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
pub fn is_absolute(iri: &str) -> bool {
    if let Some(colon_pos) = iri.find(':') {
        let scheme = &iri[..colon_pos];
        !scheme.is_empty()
            && scheme.as_bytes()[0].is_ascii_alphabetic()
            && scheme
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    } else {
        false
    }
}

/// Returns true if the IRI ends with a namespace delimiter (`/` or `#`).
pub fn is_namespace(iri: &str) -> bool {
    iri.ends_with('/') || iri.ends_with('#')
}

/// Expand a term, compact IRI or keyword against a parsed context.
///
/// With `vocab` set, bare terms resolve through term definitions and then
/// `@vocab`; otherwise only compact IRIs are expanded.
pub fn expand_iri(value: &str, ctx: &ParsedContext, vocab: bool) -> String {
    if value.starts_with('@') {
        return value.to_string();
    }
    if vocab {
        if let Some(id) = ctx.get(value).and_then(|e| e.id.as_deref()) {
            return id.to_string();
        }
    }
    if let Some((prefix, local)) = parse_prefix(value) {
        if let Some(stem) = ctx.get(prefix).and_then(|e| e.id.as_deref()) {
            return format!("{}{}", stem, local);
        }
        return value.to_string();
    }
    if vocab && !is_absolute(value) {
        if let Some(v) = ctx.vocab.as_deref() {
            return format!("{}{}", v, value);
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://example.org"));
        assert!(is_absolute("urn:local:x"));
        assert!(!is_absolute("name"));
        assert!(!is_absolute("1abc:x"));
    }

    #[test]
    fn test_expand_iri() {
        let ctx = ParsedContext::parse(
            None,
            &json!({
                "ex": "http://example.org/",
                "name": "ex:name",
                "@vocab": "http://vocab.org/"
            }),
        )
        .unwrap();
        assert_eq!(expand_iri("ex:a", &ctx, false), "http://example.org/a");
        assert_eq!(expand_iri("name", &ctx, true), "http://example.org/name");
        assert_eq!(expand_iri("other", &ctx, true), "http://vocab.org/other");
        assert_eq!(expand_iri("other", &ctx, false), "other");
        assert_eq!(expand_iri("@id", &ctx, true), "@id");
        assert_eq!(expand_iri("urn:local:k", &ctx, true), "urn:local:k");
    }
}
