//! Query shapes produced from wire constraints

mod support;

use pretty_assertions::assert_eq;
use rdfmap_query::{
    compile_construct, compile_delete, compile_select, compile_update, CollConstr, CompilerConfig,
    QueryError,
};
use rdfmap_vocab::NamespaceMap;
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;
use support::{namespaces, schemas};

fn coll(value: JsonValue) -> CollConstr {
    CollConstr::from_value(&value, &schemas(), &CompilerConfig::default()).unwrap()
}

fn select_text(value: JsonValue) -> String {
    let ns = namespaces();
    let config = CompilerConfig::default();
    compile_select(&coll(value), &ns, &config)
        .unwrap()
        .to_sparql(&ns, &config)
}

/// Query text after the PREFIX block.
fn body(text: &str) -> String {
    text.lines()
        .filter(|l| !l.starts_with("PREFIX "))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// SELECT
// ============================================================================

#[test]
fn test_property_shape_select() {
    let text = select_text(json!({"entConstrs": [{"schema": "sh:PropertyShapeShape"}]}));
    assert_eq!(
        body(&text),
        "SELECT ?eIri0 ?path0 ?name0 ?minCount0 WHERE {\n  \
         ?eIri0 rdf:type sh:PropertyShape .\n  \
         ?eIri0 sh:path ?path0 .\n  \
         OPTIONAL { ?eIri0 sh:name ?name0 . }\n  \
         OPTIONAL { ?eIri0 sh:minCount ?minCount0 . }\n}"
    );
    assert!(text.contains("PREFIX sh: <http://www.w3.org/ns/shacl#>\n"));
}

#[test]
fn test_integer_condition_is_typed() {
    let text = select_text(json!({
        "entConstrs": [{"schema": "rm:ArtifactShape", "conditions": {"identifier": 3}}]
    }));
    assert!(text.contains("?eIri0 dcterms:identifier ?identifier0 .\n"));
    assert!(!text.contains("OPTIONAL { ?eIri0 dcterms:identifier"));
    assert!(text.contains("FILTER(?identifier0 = \"3\"^^xsd:integer)"));
}

#[test]
fn test_relation_conditions() {
    let text = select_text(json!({
        "entConstrs": [{
            "schema": "rm:ArtifactShape",
            "conditions": {
                "identifier": {"relation": "between", "value": [1, 10]},
                "title": {"relation": "contains", "value": "req"}
            }
        }]
    }));
    assert!(text.contains(
        "FILTER(?identifier0 >= \"1\"^^xsd:integer && ?identifier0 < \"10\"^^xsd:integer)"
    ));
    assert!(text.contains("FILTER(CONTAINS(STR(?title0), \"req\"))"));
}

#[test]
fn test_variables_restrict_projection() {
    let text = select_text(json!({
        "entConstrs": [{"schema": "rm:ArtifactShape", "variables": ["title"]}]
    }));
    assert!(body(&text).starts_with("SELECT ?title0 WHERE {"));
}

#[test]
fn test_variables_unique_for_many_entities() {
    let entities: Vec<JsonValue> = (0..8)
        .map(|i| {
            if i % 2 == 0 {
                json!({"schema": "rm:ArtifactShape"})
            } else {
                json!({"schema": "sh:PropertyShapeShape"})
            }
        })
        .collect();
    let ns = namespaces();
    let compiled = compile_select(
        &coll(json!({"entConstrs": entities})),
        &ns,
        &CompilerConfig::default(),
    )
    .unwrap();
    let projected = compiled.query.projection().unwrap();
    let names: HashSet<&str> = projected.iter().map(|v| v.as_str()).collect();
    assert_eq!(names.len(), projected.len());
    assert_eq!(projected.len(), 4 * 3 + 4 * 4);
}

#[test]
fn test_resolve_type_select_shape() {
    let text = select_text(json!({
        "entConstrs": [{"schema": "rm:ArtifactShape", "resolveType": true}]
    }));
    assert!(body(&text).starts_with("SELECT ?type0 ?eIri0 "));
    assert!(text.contains("?eIri0 rdf:type ?type0 ."));
    assert!(!text.contains("?eIri0 rdf:type rm:Artifact ."));
    assert!(text.contains(
        "FILTER NOT EXISTS { ?subtype0 ^rdf:type ?eIri0 . ?subtype0 rdfs:subClassOf ?type0 . FILTER(?subtype0 != ?type0) }"
    ));
    assert!(text.contains(
        "FILTER EXISTS { ?type0 rdfs:subClassOf* ?supertype0 . FILTER(?supertype0 = rm:Artifact) }"
    ));
}

#[test]
fn test_resolved_type_variable_is_shared() {
    let text = select_text(json!({
        "entConstrs": [
            {"schema": "ex:TaskShape", "resolveType": true},
            {"schema": "ex:TaskShape", "conditions": {"project": "?type0"}}
        ]
    }));
    assert!(text.contains("?eIri0 rdf:type ?type0 ."));
    assert!(text.contains("?eIri1 ex:project ?type0 ."));
    assert!(!text.contains("type0_"));
}

fn event_filter(conditions: JsonValue) -> String {
    select_text(json!({"entConstrs": [{"schema": "ex:EventShape", "conditions": conditions}]}))
}

#[test]
fn test_date_time_relations() {
    let after = event_filter(json!({"at": {"relation": "after", "value": ["2020-01-01T00:00:00Z"]}}));
    assert!(after.contains("FILTER(?at0 >= \"2020-01-01T00:00:00.000Z\"^^xsd:dateTime)"));

    let before = event_filter(json!({"at": {"relation": "before", "value": [0]}}));
    assert!(before.contains("FILTER(?at0 <= \"1970-01-01T00:00:00.000Z\"^^xsd:dateTime)"));

    let between = event_filter(json!({
        "at": {"relation": "between", "value": ["2020-01-01T00:00:00+03:00", 1609459200000i64]}
    }));
    assert!(between.contains(
        "FILTER(?at0 >= \"2019-12-31T21:00:00.000Z\"^^xsd:dateTime && ?at0 < \"2021-01-01T00:00:00.000Z\"^^xsd:dateTime)"
    ));
    assert!(between.contains("?eIri0 ex:at ?at0 .\n"));
}

#[test]
fn test_negated_and_affix_relations() {
    let not_equal = event_filter(json!({"title": {"relation": "notEqual", "value": ["a", "b"]}}));
    assert!(not_equal.contains("FILTER(?title0 != \"a\" && ?title0 != \"b\")"));

    let not_contains = event_filter(json!({"title": {"relation": "notContains", "value": ["draft"]}}));
    assert!(not_contains.contains("FILTER(!CONTAINS(STR(?title0), \"draft\"))"));

    let starts = event_filter(json!({"title": {"relation": "startWith", "value": ["Re"]}}));
    assert!(starts.contains("FILTER(STRSTARTS(STR(?title0), \"Re\"))"));

    let ends = event_filter(json!({"title": {"relation": "endWith", "value": ["ing"]}}));
    assert!(ends.contains("FILTER(STRENDS(STR(?title0), \"ing\"))"));
}

#[test]
fn test_bind_condition_projects_flag() {
    let text = select_text(json!({
        "entConstrs": [{
            "schema": "ex:TaggedShape",
            "conditions": {
                "hasTags": {"bind": {"relation": "exists", "triples": [
                    {"subject": "?eIri0", "predicate": "ex:tag", "object": "?t"}
                ]}}
            }
        }]
    }));
    let select = body(&text).lines().next().unwrap_or_default().to_string();
    assert!(select.contains("?hasTags0"));
    assert!(text.contains("BIND(EXISTS { ?eIri0 ex:tag ?t"));
    assert!(text.contains("AS ?hasTags0)"));
}

#[test]
fn test_unknown_variables_are_not_projected() {
    let text = select_text(json!({
        "entConstrs": [{"schema": "ex:TaskShape", "variables": ["label", "colour"]}]
    }));
    assert!(body(&text).starts_with("SELECT ?label0 WHERE {"));
    assert!(!text.contains("?colour"));

    let text = select_text(json!({
        "entConstrs": [{
            "schema": "ex:TaggedShape",
            "variables": ["label", "t"],
            "conditions": {
                "hasTags": {"bind": {"relation": "exists", "triples": [
                    {"subject": "?eIri0", "predicate": "ex:tag", "object": "?t"}
                ]}}
            }
        }]
    }));
    assert!(body(&text).starts_with("SELECT ?label0 ?t "));
}

#[test]
fn test_unknown_schema_is_unresolved() {
    let err = CollConstr::from_value(
        &json!({"entConstrs": [{"schema": "ex:Missing"}]}),
        &schemas(),
        &CompilerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::SchemaUnresolved { iri } if iri == "ex:Missing"));
}

#[test]
fn test_strict_mode_rejects_unknown_keys() {
    let value = json!({"entConstrs": [{"schema": "rm:ArtifactShape", "conditions": {"colour": "red"}}]});
    let lenient = CollConstr::from_value(&value, &schemas(), &CompilerConfig::default()).unwrap();
    assert!(lenient.entities[0].conditions.is_empty());

    let strict = CompilerConfig::default().with_strict_properties(true);
    let err = CollConstr::from_value(&value, &schemas(), &strict).unwrap_err();
    assert!(matches!(err, QueryError::UnknownPropertyReference { entity: 0, ref key } if key == "colour"));
}

#[test]
fn test_full_iris_without_prefixes() {
    let ns = namespaces();
    let config = CompilerConfig::default().with_emit_prefixes(false);
    let text = compile_select(
        &coll(json!({"entConstrs": [{"schema": "rm:ArtifactShape", "variables": ["@id"]}]})),
        &ns,
        &config,
    )
    .unwrap()
    .to_sparql(&ns, &config);
    assert!(!text.contains("PREFIX"));
    assert!(text.contains(
        "?eIri0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://cpgu.kbpm.ru/ns/rm/rdf#Artifact> ."
    ));
}

// ============================================================================
// CONSTRUCT
// ============================================================================

#[test]
fn test_construct_defers_arrays() {
    let ns = namespaces();
    let config = CompilerConfig::default();
    let compiled = compile_construct(
        &coll(json!({"entConstrs": [{"schema": "ex:TaggedShape"}]})),
        &ns,
        &config,
    )
    .unwrap();
    assert_eq!(compiled.entities[0].arrays, vec!["tags".to_string()]);
    assert!(!compiled.to_sparql(&ns, &config).contains("ex:tag"));
}

// ============================================================================
// Updates
// ============================================================================

#[test]
fn test_update_by_property() {
    let ns = namespaces();
    let request = compile_update(
        &coll(json!({
            "entConstrs": [{
                "schema": "rm:ArtifactShape",
                "conditions": {"identifier": 1},
                "data": {"title": "Renamed"}
            }]
        })),
        &ns,
        &CompilerConfig::default(),
    )
    .unwrap();
    let text = rdfmap_sparql::ToSparql::to_sparql(&request, &ns);
    assert_eq!(
        body(&text),
        "DELETE {\n  ?eIri0 dcterms:title ?title0 .\n}\n\
         INSERT {\n  ?eIri0 dcterms:title \"Renamed\" .\n}\n\
         WHERE {\n  ?eIri0 rdf:type rm:Artifact .\n  \
         OPTIONAL { ?eIri0 dcterms:identifier ?identifier0 . }\n  \
         OPTIONAL { ?eIri0 dcterms:title ?title0 . }\n  \
         FILTER(?identifier0 = \"1\"^^xsd:integer)\n}"
    );
}

#[test]
fn test_delete_matches_any_predicate() {
    let ns = namespaces();
    let request = compile_delete(
        &coll(json!({"entConstrs": [{"schema": "rm:ArtifactShape", "conditions": {"@id": "rm:a1"}}]})),
        &ns,
        &CompilerConfig::default(),
    )
    .unwrap();
    let text = rdfmap_sparql::ToSparql::to_sparql(&request, &ns);
    assert_eq!(
        body(&text),
        "DELETE {\n  rm:a1 ?p0 ?o0 .\n}\nWHERE {\n  rm:a1 ?p0 ?o0 .\n  rm:a1 rdf:type rm:Artifact .\n}"
    );
}

#[test]
fn test_round_trip_of_known_stems() {
    let ns = NamespaceMap::with_defaults().with_prefix("rm", support::RM);
    for iri in [
        "http://cpgu.kbpm.ru/ns/rm/rdf#Artifact",
        "http://www.w3.org/ns/shacl#path",
        "http://purl.org/dc/terms/title",
    ] {
        assert_eq!(ns.de_abbreviate(&ns.abbreviate(iri)), iri);
    }
}
