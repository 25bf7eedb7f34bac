//! CONSTRUCT graphs to objects.
//!
//! The returned quads are grouped into flat nodes, each node is assigned to
//! the entity whose type (or pinned `@id`) it carries and compacted with that
//! entity's context, a linked entity's context being scoped under the
//! parent term that references it. Objects are then nested along the
//! variables the entities share, deepest entity first, and the root entity's
//! objects are returned in the collection's order.

use super::{parse_boolean, parse_integer, parse_number, type_requested};
use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, Condition, EntConstr, OrderKey};
use crate::entity::{entity_class, EntityFragment};
use crate::error::Result;
use crate::schema::ValueKind;
use rdfmap_json_ld::iri::expand_iri;
use rdfmap_json_ld::{
    parse_context, parse_context_with_base, ContextCompactor, FlatNode, NodeMap, ParsedContext, Quad,
};
use rdfmap_sparql::ast::Term;
use rdfmap_vocab::{xsd, NamespaceMap};
use serde_json::{json, Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::trace;

type Object = Map<String, JsonValue>;

/// JSON-LD context an entity's nodes are compacted with.
///
/// Namespace prefixes come first, then the schema's terms: references get
/// `@type: @id`, arrays `@container: @set`, and `xsd:string` typing is
/// dropped so plain strings compact to plain values. Bind keys map to their
/// local placeholder predicates as booleans.
pub fn entity_context(
    ent: &EntConstr,
    frag: &EntityFragment,
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> JsonValue {
    let mut ctx = Map::new();
    for (prefix, stem) in ns.iter() {
        ctx.insert(prefix.to_string(), JsonValue::String(stem.to_string()));
    }
    for (key, def) in &ent.schema.context {
        if key.starts_with('@') {
            if key == "@vocab" || key == "@base" {
                ctx.insert(key.clone(), def.clone());
            }
            continue;
        }
        let mut entry = match def {
            JsonValue::String(id) => {
                let mut m = Map::new();
                m.insert("@id".to_string(), JsonValue::String(id.clone()));
                m
            }
            JsonValue::Object(m) => m.clone(),
            other => {
                ctx.insert(key.clone(), other.clone());
                continue;
            }
        };
        let string_typed = matches!(
            entry.get("@type").and_then(JsonValue::as_str),
            Some(t) if t == "xsd:string" || t == xsd::STRING
        );
        if string_typed {
            entry.remove("@type");
        }
        let kind = ent.schema.kind_of(key);
        if kind.is_reference() && !entry.contains_key("@type") {
            entry.insert("@type".to_string(), json!("@id"));
        }
        if kind.is_array() {
            entry.insert("@container".to_string(), json!("@set"));
        }
        ctx.insert(key.clone(), JsonValue::Object(entry));
    }
    for (key, _) in frag.bind_vars.iter() {
        ctx.insert(
            key.to_string(),
            json!({"@id": config.local_iri(key), "@type": "xsd:boolean"}),
        );
    }
    JsonValue::Object(ctx)
}

/// Coerce a compacted value to a property kind.
fn coerce_value(value: JsonValue, kind: &ValueKind) -> JsonValue {
    match (value, kind) {
        (JsonValue::Array(items), ValueKind::Array(inner)) => {
            JsonValue::Array(items.into_iter().map(|v| coerce_value(v, inner)).collect())
        }
        (JsonValue::Array(items), k) => items
            .into_iter()
            .next()
            .map(|v| coerce_value(v, k))
            .unwrap_or(JsonValue::Null),
        (v, ValueKind::Array(inner)) => JsonValue::Array(vec![coerce_value(v, inner)]),
        (JsonValue::Object(m), k) if m.contains_key("@value") && !m.contains_key("@language") => {
            match m.get("@value") {
                Some(v) => coerce_value(v.clone(), k),
                None => JsonValue::Object(m),
            }
        }
        (JsonValue::String(s), ValueKind::Integer) => parse_integer(&s),
        (JsonValue::String(s), ValueKind::Number) => parse_number(&s),
        (JsonValue::String(s), ValueKind::Boolean) => parse_boolean(&s),
        (v, _) => v,
    }
}

/// The entity `j` hangs under, with the parent term naming the link.
///
/// Only earlier entities are parents. A forward link goes through the
/// parent key holding the child's `@id` variable; a back-link through the
/// parent's `@reverse` term for the child's predicate, when it has one.
fn parent_link(
    coll: &CollConstr,
    fragments: &[EntityFragment],
    j: usize,
    contexts: &[ParsedContext],
    ns: &NamespaceMap,
) -> Option<(usize, Option<String>)> {
    let ent = &coll.entities[j];
    if let Some(Condition::VarRef(name)) = ent.condition("@id") {
        let forward = (0..j).find_map(|i| {
            fragments[i]
                .props
                .key(name)
                .filter(|k| *k != "@id")
                .map(|k| (i, Some(k.to_string())))
        });
        if forward.is_some() {
            return forward;
        }
    }
    for (key, cond) in &ent.conditions {
        let Condition::VarRef(name) = cond else {
            continue;
        };
        if key == "@id" {
            continue;
        }
        let Some(pred) = ent.schema.predicate(key, ns).filter(|p| !p.reverse) else {
            continue;
        };
        let parent = (0..j).find(|&i| fragments[i].subject_var().map(|v| v.as_str()) == Some(name.as_str()));
        if let Some(i) = parent {
            let term = contexts[i].reverse_term_for(&pred.iri).map(|(t, _)| t.to_string());
            return Some((i, term));
        }
    }
    None
}

/// Null out inherited terms that would compact the child's IRIs under the
/// parent's names.
fn shadow_inherited(parent: &ParsedContext, own: JsonValue) -> Result<JsonValue> {
    let standalone = parse_context(&own)?;
    let mapped: HashSet<&str> = standalone
        .terms
        .values()
        .flat_map(|e| e.id.iter().chain(e.reverse.iter()))
        .map(String::as_str)
        .collect();
    let mut map = match own {
        JsonValue::Object(map) => map,
        other => return Ok(other),
    };
    for (term, entry) in &parent.terms {
        if standalone.contains(term) {
            continue;
        }
        if entry
            .id
            .iter()
            .chain(entry.reverse.iter())
            .any(|iri| mapped.contains(iri.as_str()))
        {
            map.insert(term.clone(), JsonValue::Null);
        }
    }
    Ok(JsonValue::Object(map))
}

/// Per-entity contexts, each linked entity's scoped to its parent's.
///
/// A child inherits the parent's terms and is attached as the `@context` of
/// the parent term referencing it, deepest first, so the root context holds
/// the whole collection.
fn scoped_contexts(
    coll: &CollConstr,
    fragments: &[EntityFragment],
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<Vec<ParsedContext>> {
    let mut contexts: Vec<ParsedContext> = Vec::with_capacity(fragments.len());
    let mut nested = Vec::new();
    for (j, (ent, frag)) in coll.entities.iter().zip(fragments).enumerate() {
        let own = entity_context(ent, frag, ns, config);
        let ctx = match parent_link(coll, fragments, j, &contexts, ns) {
            Some((i, term)) => {
                if let Some(term) = term {
                    nested.push((i, j, term));
                }
                let own = shadow_inherited(&contexts[i], own)?;
                parse_context_with_base(&contexts[i], &own)?
            }
            None => parse_context(&own)?,
        };
        contexts.push(ctx);
    }
    for (i, j, term) in nested.into_iter().rev() {
        let child = contexts[j].clone();
        if let Some(entry) = contexts[i].get_mut(&term) {
            *entry = std::mem::take(entry).with_context(child);
        }
    }
    Ok(contexts)
}

/// JSON-LD context of a whole collection: the root entity's context with
/// every linked entity's context nested under its referencing term.
pub fn collection_context(
    coll: &CollConstr,
    fragments: &[EntityFragment],
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<JsonValue> {
    let contexts = scoped_contexts(coll, fragments, ns, config)?;
    Ok(contexts.first().map(ParsedContext::to_json).unwrap_or(JsonValue::Null))
}

/// Compaction inputs of one entity.
struct Shaping<'a> {
    ent: &'a EntConstr,
    frag: &'a EntityFragment,
    ctx: ParsedContext,
    compactor: ContextCompactor,
}

impl Shaping<'_> {
    /// Selected view of a node.
    fn shape(&self, node: &FlatNode, nodes: &NodeMap, ns: &NamespaceMap) -> Object {
        let compacted = node.compact(&self.ctx, &self.compactor);
        let mut out = Map::new();
        if let Some(id) = compacted.get("@id") {
            out.insert("@id".to_string(), id.clone());
        }
        if type_requested(self.ent, self.frag) {
            if let Some(t) = compacted.get("@type") {
                out.insert("@type".to_string(), t.clone());
            }
        }
        for key in &self.frag.selected {
            if key == "@id" || key == "@type" {
                continue;
            }
            let kind = self.ent.schema.kind_of(key);
            let value = match self.ent.schema.predicate(key, ns) {
                Some(pred) if pred.reverse => self.reverse_values(node, &pred.iri, nodes),
                _ => compacted.get(key).cloned(),
            };
            if let Some(v) = value {
                out.insert(key.clone(), coerce_value(v, &kind));
            }
        }
        for (key, _) in self.frag.bind_vars.iter() {
            if let Some(v) = compacted.get(key) {
                out.insert(key.to_string(), coerce_value(v.clone(), &ValueKind::Boolean));
            }
        }
        out
    }

    /// Subjects pointing at `node` through `predicate`.
    fn reverse_values(&self, node: &FlatNode, predicate: &str, nodes: &NodeMap) -> Option<JsonValue> {
        let ids: Vec<JsonValue> = nodes
            .iter()
            .filter(|n| {
                n.values(predicate)
                    .iter()
                    .any(|v| v.as_ref_id() == Some(node.id.as_str()))
            })
            .map(|n| JsonValue::String(self.compactor.compact_id(&n.id)))
            .collect();
        match ids.len() {
            0 => None,
            1 => ids.into_iter().next(),
            _ => Some(JsonValue::Array(ids)),
        }
    }
}

/// A decoded node of one entity.
#[derive(Clone)]
struct Decoded<'a> {
    node: &'a FlatNode,
    obj: Object,
}

/// What a node must carry to stand for an entity bound through a `?var` link.
enum Link {
    /// The node has a value for the predicate
    Subject(String),
    /// Some node points at it through the predicate
    Object(String),
}

/// Link requirements of entity `j`, from its `?var` conditions.
fn links_of(coll: &CollConstr, fragments: &[EntityFragment], j: usize, ns: &NamespaceMap) -> Vec<Link> {
    let ent = &coll.entities[j];
    let mut links = Vec::new();
    for (key, cond) in &ent.conditions {
        let Condition::VarRef(name) = cond else {
            continue;
        };
        if key != "@id" {
            if let Some(pred) = ent.schema.predicate(key, ns) {
                links.push(if pred.reverse {
                    Link::Object(pred.iri)
                } else {
                    Link::Subject(pred.iri)
                });
            }
            continue;
        }
        for (i, other) in coll.entities.iter().enumerate().filter(|(i, _)| *i != j) {
            let frag = &fragments[i];
            let Some(other_key) = frag.props.key(name).or_else(|| frag.hidden.key(name)) else {
                continue;
            };
            if let Some(pred) = other.schema.predicate(other_key, ns) {
                links.push(if pred.reverse {
                    Link::Subject(pred.iri)
                } else {
                    Link::Object(pred.iri)
                });
            }
        }
    }
    let Some(subject) = fragments[j].subject_var() else {
        return links;
    };
    let others = coll.entities.iter().enumerate().filter(|(i, _)| *i != j);
    for (_, other) in others {
        for (key, cond) in &other.conditions {
            match cond {
                Condition::VarRef(name) if key != "@id" && name.as_str() == subject.as_str() => {}
                _ => continue,
            }
            if let Some(pred) = other.schema.predicate(key, ns) {
                links.push(if pred.reverse {
                    Link::Subject(pred.iri)
                } else {
                    Link::Object(pred.iri)
                });
            }
        }
    }
    links
}

fn satisfies(node: &FlatNode, links: &[Link], nodes: &NodeMap) -> bool {
    links.iter().all(|link| match link {
        Link::Subject(p) => !node.values(p).is_empty(),
        Link::Object(p) => nodes.iter().any(|n| {
            n.values(p)
                .iter()
                .any(|v| v.as_ref_id() == Some(node.id.as_str()))
        }),
    })
}

/// Nodes of each entity.
///
/// A pinned subject selects its node; otherwise the entity's class does.
/// Type-resolving entities then share out the typed nodes nobody claimed,
/// each node going to one entity only: entities tied to another by a `?var`
/// link take the nodes satisfying the link first, the rest follow in
/// collection order.
fn group_nodes<'a>(
    coll: &CollConstr,
    fragments: &[EntityFragment],
    nodes: &'a NodeMap,
    ns: &NamespaceMap,
) -> Vec<Vec<&'a FlatNode>> {
    let mut groups: Vec<Vec<&FlatNode>> = vec![Vec::new(); fragments.len()];
    let mut claimed: HashSet<&str> = HashSet::new();
    let pinned = |frag: &EntityFragment| match &frag.subject {
        Term::Iri(iri) => Some(iri.as_str().to_string()),
        _ => None,
    };

    let mut resolving = Vec::new();
    for (i, (ent, frag)) in coll.entities.iter().zip(fragments).enumerate() {
        if ent.resolve_type && pinned(frag).is_none() {
            resolving.push(i);
            continue;
        }
        let members: Vec<&FlatNode> = match (pinned(frag), entity_class(ent, ns)) {
            (Some(id), _) => nodes.get(&id).into_iter().collect(),
            (None, Some(class)) => nodes.iter().filter(|n| n.has_type(&class)).collect(),
            (None, None) => {
                let preds: Vec<String> = ent
                    .schema
                    .properties
                    .keys()
                    .filter_map(|k| ent.schema.predicate(k, ns))
                    .filter(|p| !p.reverse)
                    .map(|p| p.iri)
                    .collect();
                nodes
                    .iter()
                    .filter(|n| preds.iter().any(|p| !n.values(p).is_empty()))
                    .collect()
            }
        };
        claimed.extend(members.iter().copied().map(|n| n.id.as_str()));
        groups[i] = members;
    }

    let (linked, free): (Vec<_>, Vec<_>) = resolving
        .into_iter()
        .map(|i| (i, links_of(coll, fragments, i, ns)))
        .partition(|(_, links)| !links.is_empty());
    for (i, links) in linked.into_iter().chain(free) {
        let members: Vec<&FlatNode> = nodes
            .iter()
            .filter(|n| !n.types.is_empty() && !claimed.contains(n.id.as_str()))
            .filter(|n| satisfies(n, &links, nodes))
            .collect();
        claimed.extend(members.iter().copied().map(|n| n.id.as_str()));
        groups[i] = members;
    }
    groups
}

/// Replace references in `parents[*][key]` with the matching child objects.
fn link_forward(parents: &mut [Decoded<'_>], children: &[Decoded<'_>], key: &str, parent_ctx: &ParsedContext) {
    let find = |id: &str| {
        let iri = expand_iri(id, parent_ctx, false);
        children
            .iter()
            .find(|c| c.node.id == iri)
            .map(|c| JsonValue::Object(c.obj.clone()))
    };
    for parent in parents {
        let Some(value) = parent.obj.get_mut(key) else {
            continue;
        };
        if let Some(child) = value.as_str().and_then(|id| find(id)) {
            *value = child;
        } else if let JsonValue::Array(items) = value {
            for item in items.iter_mut() {
                if let Some(child) = item.as_str().and_then(|id| find(id)) {
                    *item = child;
                }
            }
        }
    }
}

/// Nest children under the parent they point at through `predicate`.
///
/// The children go under the parent context's `@reverse` term for the
/// predicate, or under `@reverse.{child_key}` when there is none; the
/// back-reference is dropped from each child.
fn link_reverse(
    parents: &mut [Decoded<'_>],
    children: &[Decoded<'_>],
    child_key: &str,
    predicate: &str,
    parent_ctx: &ParsedContext,
) {
    let term = parent_ctx
        .reverse_term_for(predicate)
        .map(|(t, _)| t.to_string());
    for parent in parents {
        let mine: Vec<JsonValue> = children
            .iter()
            .filter(|c| {
                c.node
                    .values(predicate)
                    .iter()
                    .any(|v| v.as_ref_id() == Some(parent.node.id.as_str()))
            })
            .map(|c| {
                let mut obj = c.obj.clone();
                obj.remove(child_key);
                JsonValue::Object(obj)
            })
            .collect();
        if mine.is_empty() {
            continue;
        }
        match &term {
            Some(t) => {
                parent.obj.insert(t.clone(), JsonValue::Array(mine));
            }
            None => {
                let reverse = parent
                    .obj
                    .entry("@reverse")
                    .or_insert_with(|| JsonValue::Object(Map::new()));
                if let JsonValue::Object(m) = reverse {
                    m.insert(child_key.to_string(), JsonValue::Array(mine));
                }
            }
        }
    }
}

fn sort_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => sort_text(x).cmp(&sort_text(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_objects(objs: &mut [(String, Object)], keys: &[OrderKey], root: &EntityFragment) {
    if keys.is_empty() {
        return;
    }
    let resolved: Vec<(String, bool)> = keys
        .iter()
        .map(|k| {
            let key = match k.key.strip_prefix('?') {
                Some(var) => root.props.key(var).unwrap_or(var).to_string(),
                None => k.key.clone(),
            };
            (key, k.desc)
        })
        .collect();
    objs.sort_by(|a, b| {
        resolved
            .iter()
            .map(|(key, desc)| {
                let ord = compare_values(a.1.get(key), b.1.get(key));
                if *desc {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Decode CONSTRUCT quads into the root entity's objects.
pub fn decode_graph(
    quads: &[Quad],
    coll: &CollConstr,
    fragments: &[EntityFragment],
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<Vec<Object>> {
    let roots = decode_graph_nodes(quads, coll, fragments, ns, config)?;
    Ok(roots.into_iter().map(|(_, obj)| obj).collect())
}

/// Like [`decode_graph`], pairing each root object with its node's full IRI.
pub(crate) fn decode_graph_nodes(
    quads: &[Quad],
    coll: &CollConstr,
    fragments: &[EntityFragment],
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<Vec<(String, Object)>> {
    let nodes = NodeMap::from_quads(quads)?;
    let shapings: Vec<Shaping<'_>> = scoped_contexts(coll, fragments, ns, config)?
        .into_iter()
        .zip(coll.entities.iter().zip(fragments))
        .map(|(ctx, (ent, frag))| Shaping {
            ent,
            frag,
            compactor: ContextCompactor::new(&ctx),
            ctx,
        })
        .collect();

    let groups = group_nodes(coll, fragments, &nodes, ns);
    let mut decoded: Vec<Vec<Decoded<'_>>> = groups
        .iter()
        .zip(&shapings)
        .map(|(members, shaping)| {
            members
                .iter()
                .map(|&node| Decoded {
                    node,
                    obj: shaping.shape(node, &nodes, ns),
                })
                .collect()
        })
        .collect();
    trace!(
        nodes = nodes.len(),
        groups = ?decoded.iter().map(Vec::len).collect::<Vec<_>>(),
        "grouped construct nodes"
    );

    for j in (1..decoded.len()).rev() {
        let children = decoded[j].clone();
        let ent = &coll.entities[j];

        if let Some(Condition::VarRef(name)) = ent.condition("@id") {
            for i in (0..decoded.len()).filter(|i| *i != j) {
                if let Some(key) = fragments[i].props.key(name).filter(|k| *k != "@id") {
                    link_forward(&mut decoded[i], &children, key, &shapings[i].ctx);
                }
            }
        }

        for (child_key, cond) in &ent.conditions {
            let Condition::VarRef(name) = cond else {
                continue;
            };
            if child_key == "@id" {
                continue;
            }
            let Some(pred) = ent.schema.predicate(child_key, ns).filter(|p| !p.reverse) else {
                continue;
            };
            for i in (0..decoded.len()).filter(|i| *i != j) {
                if fragments[i].subject_var().map(|v| v.as_str()) == Some(name.as_str()) {
                    link_reverse(&mut decoded[i], &children, child_key, &pred.iri, &shapings[i].ctx);
                }
            }
        }
    }

    let mut roots: Vec<(String, Object)> = decoded
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|d| (d.node.id.clone(), d.obj))
        .collect();
    if let (Some(root), Some(frag)) = (coll.root(), fragments.first()) {
        let mut keys = coll.order_by.clone();
        keys.extend(root.order_by.iter().cloned());
        sort_objects(&mut roots, &keys, frag);
    }
    Ok(roots)
}
