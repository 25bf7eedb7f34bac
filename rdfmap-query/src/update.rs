//! Update statement assembler: insert, update and delete.
//!
//! Each entity of the collection becomes one operation; the operations are
//! joined into a single update request.

use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, Condition, EntConstr};
use crate::entity::{
    compile_entity, condition_filter, entity_class, property_triple, subject_term, CompileOptions,
};
use crate::error::{QueryError, Result};
use crate::hierarchy::exact_type;
use crate::literal::encode_value;
use crate::vars::VarAllocator;
use rdfmap_sparql::ast::{
    GraphPattern, Modify, Term, TriplePattern, UpdateOperation, UpdateRequest,
};
use rdfmap_vocab::NamespaceMap;
use serde_json::Value as JsonValue;
use tracing::trace;

/// Data values as RDF terms; arrays yield one term per element, null none.
fn data_terms(ent: &EntConstr, key: &str, value: &JsonValue, ns: &NamespaceMap) -> Vec<Term> {
    let kind = ent.schema.kind_of(key);
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(values) => values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| encode_value(v, &kind, ns))
            .collect(),
        v => vec![encode_value(v, &kind, ns)],
    }
}

/// Data keys carrying property values (not `@id`/`@type`).
fn data_keys(ent: &EntConstr) -> impl Iterator<Item = (&String, &JsonValue)> {
    ent.data
        .iter()
        .filter(|(k, _)| k.as_str() != "@id" && k.as_str() != "@type")
}

/// One `INSERT DATA` per entity, `data['@id']` as subject.
pub fn compile_insert(coll: &CollConstr, ns: &NamespaceMap, _config: &CompilerConfig) -> Result<UpdateRequest> {
    let mut request = UpdateRequest::default();
    for ent in &coll.entities {
        let subject = ent
            .data
            .get("@id")
            .and_then(JsonValue::as_str)
            .map(|iri| Term::iri(ns.de_abbreviate(iri)))
            .ok_or(QueryError::MissingSubject { entity: ent.index })?;

        let mut triples = Vec::new();
        let class = match ent.data.get("@type").and_then(JsonValue::as_str) {
            Some(t) => Some(ns.de_abbreviate(t)),
            None => ent.schema.target_class_iri(ns),
        };
        if let Some(class) = class {
            triples.push(exact_type(&subject, &class));
        }
        for (key, value) in data_keys(ent) {
            let Some(pred) = ent.schema.predicate(key, ns) else {
                trace!(entity = ent.index, key = %key, "no predicate for data key");
                continue;
            };
            for term in data_terms(ent, key, value, ns) {
                triples.push(property_triple(&subject, &pred, term));
            }
        }
        request.push(UpdateOperation::InsertData(triples));
    }
    Ok(request)
}

/// `DELETE {old} INSERT {new} WHERE {...}` per entity.
///
/// Only keys present in `data` are touched; a `null` value deletes without
/// inserting. Without an `@id` pin the entity is found through its
/// conditions, matched as OPTIONALs and narrowed by FILTERs.
pub fn compile_update(coll: &CollConstr, ns: &NamespaceMap, _config: &CompilerConfig) -> Result<UpdateRequest> {
    let mut request = UpdateRequest::default();
    let mut alloc = VarAllocator::new();
    for ent in &coll.entities {
        let subject = subject_term(ent, ns, &mut alloc)?;
        let pinned = !subject.is_var();
        let mut required = Vec::new();
        if let Some(class) = entity_class(ent, ns) {
            required.push(exact_type(&subject, &class));
        }
        let mut where_clause = vec![GraphPattern::Bgp(required)];
        let mut filters = Vec::new();
        let mut matched: Vec<(String, rdfmap_sparql::ast::Var)> = Vec::new();

        if !pinned {
            for (key, cond) in &ent.conditions {
                if key == "@id" || key == "@type" {
                    continue;
                }
                if matches!(cond, Condition::VarRef(_) | Condition::Bind { .. }) {
                    trace!(entity = ent.index, key = %key, "condition ignored in update");
                    continue;
                }
                let Some(pred) = ent.schema.predicate(key, ns) else {
                    continue;
                };
                let var = alloc.alloc_or_join(&format!("{}{}", key, ent.index));
                where_clause.push(GraphPattern::optional_triple(property_triple(
                    &subject,
                    &pred,
                    Term::Var(var.clone()),
                )));
                filters.extend(condition_filter(
                    ent, &subject, &pred, key, &var, cond, &mut alloc, ns,
                ));
                matched.push((key.clone(), var));
            }
        }

        let mut delete = Vec::new();
        let mut insert = Vec::new();
        for (key, value) in data_keys(ent) {
            let Some(pred) = ent.schema.predicate(key, ns) else {
                trace!(entity = ent.index, key = %key, "no predicate for data key");
                continue;
            };
            let var = match matched.iter().find(|(k, _)| k == key) {
                Some((_, v)) => v.clone(),
                None => {
                    let v = alloc.alloc_or_join(&format!("{}{}", key, ent.index));
                    where_clause.push(GraphPattern::optional_triple(property_triple(
                        &subject,
                        &pred,
                        Term::Var(v.clone()),
                    )));
                    v
                }
            };
            delete.push(property_triple(&subject, &pred, Term::Var(var)));
            for term in data_terms(ent, key, value, ns) {
                insert.push(property_triple(&subject, &pred, term));
            }
        }
        where_clause.extend(filters.into_iter().map(GraphPattern::filter));
        request.push(Modify::new(delete, insert, where_clause));
    }
    Ok(request)
}

/// `DELETE {S ?p ?o} WHERE {S ?p ?o . type + conditions}` per entity.
pub fn compile_delete(coll: &CollConstr, ns: &NamespaceMap, config: &CompilerConfig) -> Result<UpdateRequest> {
    let mut request = UpdateRequest::default();
    let mut alloc = VarAllocator::new();
    for ent in &coll.entities {
        let mut selector = ent.clone();
        selector.variables = Some(Vec::new());
        selector.resolve_type = false;
        let frag = compile_entity(&selector, ns, config, &mut alloc, CompileOptions::default())?;

        let p = alloc.alloc(&format!("p{}", ent.index));
        let o = alloc.alloc(&format!("o{}", ent.index));
        let any = TriplePattern::new(frag.subject.clone(), p, Term::Var(o));

        let mut required = vec![any.clone()];
        required.extend(frag.mandatory.iter().cloned());
        let mut where_clause = vec![GraphPattern::Bgp(required)];
        where_clause.extend(frag.filter_patterns());
        request.push(Modify::new(vec![any], Vec::new(), where_clause));
    }
    Ok(request)
}
