//! Collection assembler: CONSTRUCT.
//!
//! A CONSTRUCT returns triples, not solutions, so LIMIT/OFFSET on the outer
//! query would cut the result at an arbitrary triple. An entity that carries
//! its own ORDER BY, LIMIT or OFFSET is therefore moved into a sub-select
//! projecting its variables; the outer query has no solution modifiers.
//! Collection-level shaping applies to the root entity's sub-select.

use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, EntConstr};
use crate::entity::{CompileOptions, EntityFragment};
use crate::error::Result;
use crate::select::{compile_entities, merge_patterns, order_conditions};
use rdfmap_sparql::ast::{ConstructQuery, GraphPattern, SelectQuery, SolutionModifiers};
use rdfmap_sparql::ToSparql;
use rdfmap_vocab::NamespaceMap;

/// A CONSTRUCT query with the fragments needed to decode its graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConstruct {
    pub query: ConstructQuery,
    pub entities: Vec<EntityFragment>,
}

impl CompiledConstruct {
    pub fn to_sparql(&self, ns: &NamespaceMap, config: &CompilerConfig) -> String {
        self.query.to_sparql_with(ns, config.render_options())
    }
}

/// Solution modifiers entity `ent` needs inside its own sub-select, if any.
fn subquery_modifiers(coll: &CollConstr, ent: &EntConstr, frag: &EntityFragment) -> Option<SolutionModifiers> {
    let (order_keys, limit, offset) = if ent.index == 0 {
        let mut keys = coll.order_by.clone();
        keys.extend(ent.order_by.iter().cloned());
        (keys, coll.limit.or(ent.limit), coll.offset.or(ent.offset))
    } else {
        (ent.order_by.clone(), ent.limit, ent.offset)
    };
    if order_keys.is_empty() && limit.is_none() && offset.is_none() {
        return None;
    }
    Some(
        SolutionModifiers::new()
            .with_order_by(order_conditions(&order_keys, std::iter::once(frag)))
            .with_limit(limit)
            .with_offset(offset),
    )
}

/// Compile a collection constraint into one CONSTRUCT.
pub fn compile_construct(
    coll: &CollConstr,
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<CompiledConstruct> {
    let fragments = compile_entities(coll, ns, config, CompileOptions::default())?;

    let template = fragments.iter().flat_map(EntityFragment::template).collect();

    let mut subqueries = Vec::new();
    let mut flat = Vec::new();
    for (ent, frag) in coll.entities.iter().zip(&fragments) {
        match subquery_modifiers(coll, ent, frag) {
            Some(modifiers) if frag.service.is_none() => {
                let distinct = ent.distinct || (ent.index == 0 && coll.distinct);
                let inner = SelectQuery::new(frag.bound_vars(), frag.patterns())
                    .with_distinct(distinct)
                    .with_modifiers(modifiers);
                subqueries.push(GraphPattern::Subquery(Box::new(inner)));
            }
            _ => flat.push(frag.clone()),
        }
    }

    let mut where_clause = subqueries;
    where_clause.extend(merge_patterns(&flat));

    Ok(CompiledConstruct {
        query: ConstructQuery::new(template, where_clause),
        entities: fragments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::OrderKey;
    use crate::schema::EntitySchema;
    use serde_json::json;

    fn ns() -> NamespaceMap {
        NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/")
    }

    fn schema() -> EntitySchema {
        serde_json::from_value(json!({
            "@id": "ex:ThingShape",
            "targetClass": "ex:Thing",
            "@context": {"name": "ex:name", "tags": "ex:tag"},
            "properties": {
                "@id": {"type": "string", "format": "iri"},
                "name": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["@id", "name"]
        }))
        .unwrap()
    }

    #[test]
    fn test_template_and_flat_where() {
        let coll = CollConstr::single(EntConstr::new(0, schema()));
        let text = compile_construct(&coll, &ns(), &CompilerConfig::default())
            .unwrap()
            .to_sparql(&ns(), &CompilerConfig::default());
        assert_eq!(
            text,
            "PREFIX ex: <http://example.org/>\n\
             PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
             CONSTRUCT {\n  ?eIri0 rdf:type ex:Thing .\n  ?eIri0 ex:name ?name0 .\n}\n\
             WHERE {\n  ?eIri0 rdf:type ex:Thing .\n  ?eIri0 ex:name ?name0 .\n}"
        );
    }

    #[test]
    fn test_limited_entity_becomes_subquery() {
        let mut root = EntConstr::new(0, schema());
        root.order_by = vec![OrderKey::asc("name")];
        let mut coll = CollConstr::single(root);
        coll.limit = Some(2);
        let compiled = compile_construct(&coll, &ns(), &CompilerConfig::default()).unwrap();
        assert!(compiled.query.modifiers.is_empty());
        let text = compiled.to_sparql(&ns(), &CompilerConfig::default());
        assert!(text.contains(
            "{ SELECT ?eIri0 ?name0 WHERE { ?eIri0 rdf:type ex:Thing . ?eIri0 ex:name ?name0 . } ORDER BY ASC(?name0) LIMIT 2 }"
        ));
    }
}
