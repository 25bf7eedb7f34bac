//! Context parsing and node compaction against schema-shaped contexts

use pretty_assertions::assert_eq;
use rdfmap_json_ld::{
    expand_iri, parse_context, parse_context_with_base, ContextCompactor, NodeMap, ParsedContext,
    Quad, QuadTerm, TypeValue,
};
use rdfmap_vocab::{rdf, xsd, NamespaceMap};
use serde_json::json;

fn namespaces() -> NamespaceMap {
    NamespaceMap::with_defaults()
        .with_prefix("rm", "http://cpgu.kbpm.ru/ns/rm/rdf#")
        .with_prefix("ex", "http://example.org/")
}

fn prefix_context() -> ParsedContext {
    let prefixes: serde_json::Map<_, _> = namespaces()
        .iter()
        .map(|(prefix, stem)| (prefix.to_string(), json!(stem)))
        .collect();
    parse_context(&serde_json::Value::Object(prefixes)).unwrap()
}

// ============================================================================
// Context Parsing
// ============================================================================

#[test]
fn test_schema_context_over_namespace_prefixes() {
    let base = prefix_context();
    let ctx = parse_context_with_base(
        &base,
        &json!({
            "identifier": {"@id": "dcterms:identifier", "@type": "xsd:integer"},
            "title": "dcterms:title",
            "creator": {"@id": "dcterms:creator", "@type": "@id"}
        }),
    )
    .unwrap();

    assert_eq!(
        ctx.get("identifier").unwrap().id.as_deref(),
        Some("http://purl.org/dc/terms/identifier")
    );
    assert_eq!(
        ctx.get("identifier").unwrap().type_,
        Some(TypeValue::Iri(xsd::INTEGER.to_string()))
    );
    assert_eq!(
        expand_iri("rm:Artifact", &ctx),
        "http://cpgu.kbpm.ru/ns/rm/rdf#Artifact"
    );
    assert_eq!(
        ContextCompactor::new(&ctx).compact_vocab("http://cpgu.kbpm.ru/ns/rm/rdf#Artifact"),
        "rm:Artifact"
    );
}

#[test]
fn test_vocab_with_references() {
    let ctx = parse_context(&json!({
        "@vocab": "https://schema.org/",
        "reverseRef": {"@reverse": "isBasedOn"},
        "explicit": "name",
        "dontTouch": "https://example.com/ns#42"
    }))
    .unwrap();

    assert_eq!(ctx.vocab, Some("https://schema.org/".to_string()));
    assert_eq!(
        ctx.get("reverseRef").unwrap().reverse,
        Some("https://schema.org/isBasedOn".to_string())
    );
    assert_eq!(
        ctx.get("explicit").unwrap().id,
        Some("https://schema.org/name".to_string())
    );
    assert_eq!(
        ctx.get("dontTouch").unwrap().id,
        Some("https://example.com/ns#42".to_string())
    );
}

#[test]
fn test_array_context_is_sequential() {
    let ctx = parse_context(&json!([
        {"ex": "http://example.org/"},
        {"name": "ex:name"}
    ]))
    .unwrap();
    assert_eq!(
        ctx.get("name").unwrap().id.as_deref(),
        Some("http://example.org/name")
    );
}

#[test]
fn test_invalid_context_type() {
    assert!(parse_context(&json!(42)).is_err());
}

// ============================================================================
// Node compaction
// ============================================================================

#[test]
fn test_compact_artifact_nodes() {
    let base = prefix_context();
    let ctx = parse_context_with_base(
        &base,
        &json!({
            "identifier": {"@id": "dcterms:identifier", "@type": "xsd:integer"},
            "title": "dcterms:title",
            "creator": {"@id": "dcterms:creator", "@type": "@id"}
        }),
    )
    .unwrap();
    let compactor = ContextCompactor::new(&ctx);

    let subject = || QuadTerm::named("http://example.org/artifacts/1");
    let quads = vec![
        Quad::new(
            subject(),
            QuadTerm::named(rdf::TYPE),
            QuadTerm::named("http://cpgu.kbpm.ru/ns/rm/rdf#Artifact"),
        ),
        Quad::new(
            subject(),
            QuadTerm::named("http://purl.org/dc/terms/identifier"),
            QuadTerm::literal("1", Some(xsd::INTEGER)),
        ),
        Quad::new(
            subject(),
            QuadTerm::named("http://purl.org/dc/terms/title"),
            QuadTerm::literal("Requirement", None),
        ),
        Quad::new(
            subject(),
            QuadTerm::named("http://purl.org/dc/terms/creator"),
            QuadTerm::named("http://example.org/users/amivanoff"),
        ),
    ];

    let nodes = NodeMap::from_quads(&quads).unwrap();
    assert_eq!(nodes.len(), 1);
    let node = nodes
        .get("http://example.org/artifacts/1")
        .unwrap()
        .compact(&ctx, &compactor);

    assert_eq!(
        serde_json::Value::Object(node),
        json!({
            "@id": "ex:artifacts/1",
            "@type": "rm:Artifact",
            "identifier": "1",
            "title": "Requirement",
            "creator": "ex:users/amivanoff"
        })
    );
}

#[test]
fn test_multiple_types_become_array() {
    let ctx = prefix_context();
    let compactor = ContextCompactor::new(&ctx);
    let s = || QuadTerm::named("http://example.org/x");
    let quads = vec![
        Quad::new(s(), QuadTerm::named(rdf::TYPE), QuadTerm::named("http://example.org/A")),
        Quad::new(s(), QuadTerm::named(rdf::TYPE), QuadTerm::named("http://example.org/B")),
    ];
    let nodes = NodeMap::from_quads(&quads).unwrap();
    let node = nodes.get("http://example.org/x").unwrap().compact(&ctx, &compactor);
    assert_eq!(node["@type"], json!(["ex:A", "ex:B"]));
}
