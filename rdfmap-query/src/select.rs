//! Collection assembler: SELECT.
//!
//! Entities are compiled in collection order against one allocator, then
//! merged into a single WHERE clause:
//!
//! 1. every mandatory triple of every local entity, as one BGP
//! 2. SERVICE blocks of entities bound to a remote endpoint
//! 3. every OPTIONAL
//! 4. every FILTER
//! 5. every BIND

use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, OrderKey};
use crate::entity::{compile_entity, reserve_shared, CompileOptions, EntityFragment};
use crate::error::Result;
use crate::vars::VarAllocator;
use rdfmap_sparql::ast::{
    GraphPattern, OrderCondition, SelectQuery, SolutionModifiers, Var,
};
use rdfmap_sparql::ToSparql;
use rdfmap_vocab::NamespaceMap;

/// A SELECT query with the fragments needed to decode its bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelect {
    pub query: SelectQuery,
    pub entities: Vec<EntityFragment>,
}

impl CompiledSelect {
    pub fn to_sparql(&self, ns: &NamespaceMap, config: &CompilerConfig) -> String {
        self.query.to_sparql_with(ns, config.render_options())
    }
}

/// Compile every entity of a collection against one allocator.
pub(crate) fn compile_entities(
    coll: &CollConstr,
    ns: &NamespaceMap,
    config: &CompilerConfig,
    options: CompileOptions,
) -> Result<Vec<EntityFragment>> {
    let mut alloc = VarAllocator::new();
    reserve_shared(&coll.entities, &mut alloc);
    coll.entities
        .iter()
        .map(|ent| compile_entity(ent, ns, config, &mut alloc, options))
        .collect()
}

/// Resolve order keys to ORDER BY conditions through the fragments' maps.
///
/// A `?var` key is used verbatim. Keys no fragment maps are skipped.
pub(crate) fn order_conditions<'a>(
    keys: &[OrderKey],
    candidates: impl Iterator<Item = &'a EntityFragment> + Clone,
) -> Vec<OrderCondition> {
    keys.iter()
        .filter_map(|k| {
            let var = match k.key.strip_prefix('?') {
                Some(name) => Some(Var::new(name)),
                None => candidates.clone().find_map(|f| f.var_for(&k.key).cloned()),
            };
            if var.is_none() {
                tracing::trace!(key = %k.key, "order key not bound by any entity");
            }
            var.map(|v| {
                if k.desc {
                    OrderCondition::desc(v)
                } else {
                    OrderCondition::asc(v)
                }
            })
        })
        .collect()
}

/// Projection of all fragments, deduplicated, in entity order.
pub(crate) fn projection(fragments: &[EntityFragment]) -> Vec<Var> {
    let mut vars: Vec<Var> = Vec::new();
    for v in fragments.iter().flat_map(EntityFragment::projection) {
        if !vars.contains(v) {
            vars.push(v.clone());
        }
    }
    vars
}

/// Merge fragments into one WHERE clause.
pub(crate) fn merge_patterns(fragments: &[EntityFragment]) -> Vec<GraphPattern> {
    let (remote, local): (Vec<&EntityFragment>, Vec<&EntityFragment>) =
        fragments.iter().partition(|f| f.service.is_some());

    let mut where_clause = Vec::new();
    let mandatory: Vec<_> = local
        .iter()
        .flat_map(|f| f.mandatory.iter().cloned())
        .collect();
    if !mandatory.is_empty() {
        where_clause.push(GraphPattern::Bgp(mandatory));
    }
    for f in &remote {
        if let Some(endpoint) = &f.service {
            where_clause.push(GraphPattern::Service {
                endpoint: endpoint.clone(),
                silent: false,
                patterns: f.patterns(),
            });
        }
    }
    where_clause.extend(local.iter().flat_map(|f| f.optional_patterns()));
    where_clause.extend(local.iter().flat_map(|f| f.filter_patterns()));
    where_clause.extend(local.iter().flat_map(|f| f.bind_patterns()));
    where_clause
}

/// Compile a collection constraint into one SELECT.
///
/// ORDER BY lists collection keys first, then each entity's own keys.
/// LIMIT and OFFSET come from the collection, else from the root entity.
/// DISTINCT applies when the collection or any entity asks for it.
pub fn compile_select(coll: &CollConstr, ns: &NamespaceMap, config: &CompilerConfig) -> Result<CompiledSelect> {
    compile_select_with(coll, ns, config, CompileOptions::default())
}

pub(crate) fn compile_select_with(
    coll: &CollConstr,
    ns: &NamespaceMap,
    config: &CompilerConfig,
    options: CompileOptions,
) -> Result<CompiledSelect> {
    let fragments = compile_entities(coll, ns, config, options)?;

    let mut order_by = order_conditions(&coll.order_by, fragments.iter());
    for (ent, frag) in coll.entities.iter().zip(&fragments) {
        order_by.extend(order_conditions(&ent.order_by, std::iter::once(frag)));
    }
    let root = coll.root();
    let modifiers = SolutionModifiers::new()
        .with_order_by(order_by)
        .with_limit(coll.limit.or_else(|| root.and_then(|r| r.limit)))
        .with_offset(coll.offset.or_else(|| root.and_then(|r| r.offset)));
    let distinct = coll.distinct || coll.entities.iter().any(|e| e.distinct);

    let query = SelectQuery::new(projection(&fragments), merge_patterns(&fragments))
        .with_distinct(distinct)
        .with_modifiers(modifiers);

    Ok(CompiledSelect {
        query,
        entities: fragments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Condition, EntConstr};
    use crate::schema::EntitySchema;
    use serde_json::json;
    use std::collections::HashSet;

    fn schema(id: &str, keys: &[&str]) -> EntitySchema {
        let mut context = serde_json::Map::new();
        let mut properties = serde_json::Map::new();
        for k in keys {
            context.insert(k.to_string(), json!(format!("ex:{}", k)));
            properties.insert(k.to_string(), json!({"type": "string"}));
        }
        serde_json::from_value(json!({
            "@id": id,
            "targetClass": "ex:Thing",
            "@context": context,
            "properties": properties
        }))
        .unwrap()
    }

    #[test]
    fn test_variables_unique_across_entities() {
        // title1 of entity 0 and title of entity 1 want the same name
        let mut entities = vec![EntConstr::new(0, schema("ex:A", &["title1", "title"]))];
        for i in 1..12 {
            entities.push(EntConstr::new(i, schema("ex:B", &["title", "title1"])));
        }
        let coll = CollConstr {
            entities,
            ..CollConstr::single(EntConstr::new(0, EntitySchema::default()))
        };
        let ns = NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/");
        let compiled = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap();
        let projected = compiled.query.projection().unwrap();
        let unique: HashSet<&str> = projected.iter().map(Var::as_str).collect();
        assert_eq!(unique.len(), projected.len());
        assert_eq!(projected.len(), 12 * 3);
    }

    #[test]
    fn test_modifiers() {
        let mut root = EntConstr::new(0, schema("ex:A", &["title"]));
        root.limit = Some(10);
        root.offset = Some(20);
        root.order_by = vec![OrderKey::desc("title")];
        let mut coll = CollConstr::single(root);
        coll.limit = Some(5);
        coll.distinct = true;
        let ns = NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/");
        let q = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap().query;
        assert_eq!(q.modifiers.limit, Some(5));
        assert_eq!(q.modifiers.offset, Some(20));
        assert_eq!(q.modifiers.order_by, vec![OrderCondition::desc(Var::new("title0"))]);
        assert!(q.modifier.is_some());
    }

    #[test]
    fn test_service_entity_is_wrapped() {
        let root = EntConstr::new(0, schema("ex:A", &["title"]));
        let mut remote = EntConstr::new(1, schema("ex:B", &["label"]))
            .with_condition("@id", Condition::VarRef("eIri0".into()));
        remote.service = Some("http://remote.example.org/sparql".into());
        let mut coll = CollConstr::single(root);
        coll.entities.push(remote);
        let ns = NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/");
        let compiled = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap();
        let text = compiled.to_sparql(&ns, &CompilerConfig::default());
        assert!(text.contains(
            "SERVICE <http://remote.example.org/sparql> { ?eIri0 rdf:type ex:Thing . OPTIONAL { ?eIri0 ex:label ?label1 . } }"
        ));
    }
}
