//! SELECT bindings to objects.
//!
//! Every row yields one object. Each entity decodes its own projected
//! variables, then the per-entity objects are merged into the root's: new
//! keys are added, a key another entity already filled with a different
//! value is suffixed with the entity index, `@type` accumulates.

use super::{parse_boolean, parse_integer, parse_number, type_requested};
use crate::client::{BindingValue, SelectResults};
use crate::constraint::{Condition, EntConstr};
use crate::entity::{entity_class, EntityFragment};
use crate::literal::reference_iri;
use crate::schema::ValueKind;
use rdfmap_vocab::{xsd, NamespaceMap};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// Convert one binding to JSON.
///
/// IRIs are abbreviated and blank nodes keep their `_:` label. With a known
/// kind the lexical value is parsed to it; otherwise the datatype decides.
pub fn coerce_binding(binding: &BindingValue, kind: Option<&ValueKind>, ns: &NamespaceMap) -> JsonValue {
    if binding.is_iri() {
        return JsonValue::String(ns.abbreviate(&binding.value));
    }
    if binding.is_blank() {
        return JsonValue::String(format!("_:{}", binding.value));
    }
    let value = binding.value.as_str();
    match kind.map(ValueKind::element) {
        Some(ValueKind::Integer) => parse_integer(value),
        Some(ValueKind::Number) => parse_number(value),
        Some(ValueKind::Boolean) => parse_boolean(value),
        Some(ValueKind::Iri) | Some(ValueKind::Object) => JsonValue::String(ns.abbreviate(value)),
        Some(_) => JsonValue::String(value.to_string()),
        None => match binding.datatype.as_deref() {
            Some(dt) if xsd::is_integer_family(dt) => parse_integer(value),
            Some(dt) if xsd::is_decimal_family(dt) => parse_number(value),
            Some(dt) if dt == xsd::BOOLEAN => parse_boolean(value),
            _ => JsonValue::String(value.to_string()),
        },
    }
}

fn decode_entity(
    row: &HashMap<String, BindingValue>,
    ent: &EntConstr,
    frag: &EntityFragment,
    ns: &NamespaceMap,
) -> Map<String, JsonValue> {
    let mut obj = Map::new();
    for (key, var) in frag.props.iter() {
        if let Some(binding) = row.get(var.as_str()) {
            let kind = ent.knows(key).then(|| ent.schema.kind_of(key));
            obj.insert(key.to_string(), coerce_binding(binding, kind.as_ref(), ns));
        }
    }
    for (key, var) in frag.bind_vars.iter() {
        if let Some(binding) = row.get(var.as_str()) {
            obj.insert(key.to_string(), coerce_binding(binding, Some(&ValueKind::Boolean), ns));
        }
    }
    fill_pinned(&mut obj, ent, frag, ns);
    obj
}

/// Selected keys the query did not bind because a condition fixed them.
fn fill_pinned(obj: &mut Map<String, JsonValue>, ent: &EntConstr, frag: &EntityFragment, ns: &NamespaceMap) {
    for (key, cond) in &ent.conditions {
        if obj.contains_key(key) || !frag.selected.iter().any(|k| k == key) {
            continue;
        }
        let Condition::Value(value) = cond else {
            continue;
        };
        let value = match reference_iri(value) {
            Some(iri) if ent.schema.kind_of(key).is_reference() => {
                JsonValue::String(ns.abbreviate(&ns.de_abbreviate(iri)))
            }
            _ => value.clone(),
        };
        obj.insert(key.clone(), value);
    }
    if !ent.resolve_type && !obj.contains_key("@type") && type_requested(ent, frag) {
        if let Some(class) = entity_class(ent, ns) {
            obj.insert("@type".to_string(), JsonValue::String(ns.abbreviate(&class)));
        }
    }
}

fn merge_type(root: &mut Map<String, JsonValue>, value: JsonValue) {
    let incoming = match value {
        JsonValue::Array(items) => items,
        v => vec![v],
    };
    match root.get_mut("@type") {
        None => {
            let v = match incoming.len() {
                1 => incoming.into_iter().next().unwrap_or(JsonValue::Null),
                _ => JsonValue::Array(incoming),
            };
            root.insert("@type".to_string(), v);
        }
        Some(existing) => {
            let mut types = match existing.take() {
                JsonValue::Array(items) => items,
                v => vec![v],
            };
            for t in incoming {
                if !types.contains(&t) {
                    types.push(t);
                }
            }
            *existing = match types.len() {
                1 => types.into_iter().next().unwrap_or(JsonValue::Null),
                _ => JsonValue::Array(types),
            };
        }
    }
}

fn merge(objs: Vec<Map<String, JsonValue>>) -> Map<String, JsonValue> {
    let mut iter = objs.into_iter().enumerate();
    let Some((_, mut root)) = iter.next() else {
        return Map::new();
    };
    for (index, obj) in iter {
        for (key, value) in obj {
            if key == "@type" {
                merge_type(&mut root, value);
                continue;
            }
            match root.get(&key) {
                None => {
                    root.insert(key, value);
                }
                Some(existing) if *existing == value => {}
                Some(_) => {
                    root.insert(format!("{}{}", key, index), value);
                }
            }
        }
    }
    root
}

/// Decode SELECT results, one object per solution row.
pub fn decode_bindings(
    results: &SelectResults,
    entities: &[EntConstr],
    fragments: &[EntityFragment],
    ns: &NamespaceMap,
) -> Vec<Map<String, JsonValue>> {
    results
        .bindings
        .iter()
        .map(|row| {
            // A shared `?var` sits in the map of every entity naming it, so
            // each entity decodes it from the row itself.
            let objs: Vec<_> = entities
                .iter()
                .zip(fragments)
                .map(|(ent, frag)| decode_entity(row, ent, frag, ns))
                .collect();
            merge(objs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::constraint::CollConstr;
    use crate::schema::EntitySchema;
    use crate::select::compile_select;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ns() -> NamespaceMap {
        NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/")
    }

    fn schema() -> EntitySchema {
        serde_json::from_value(json!({
            "@id": "ex:ThingShape",
            "targetClass": "ex:Thing",
            "@context": {"name": "ex:name", "count": "ex:count", "owner": {"@id": "ex:owner", "@type": "@id"}},
            "properties": {
                "@id": {"type": "string", "format": "iri"},
                "name": {"type": "string"},
                "count": {"type": "integer"},
                "owner": {"type": "string", "format": "iri"}
            }
        }))
        .unwrap()
    }

    fn row(pairs: &[(&str, BindingValue)]) -> HashMap<String, BindingValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_coerce_by_kind_and_datatype() {
        let ns = ns();
        assert_eq!(
            coerce_binding(&BindingValue::uri("http://example.org/a"), None, &ns),
            json!("ex:a")
        );
        assert_eq!(
            coerce_binding(&BindingValue::literal("7"), Some(&ValueKind::Integer), &ns),
            json!(7)
        );
        assert_eq!(
            coerce_binding(&BindingValue::typed("2.5", xsd::DECIMAL), None, &ns),
            json!(2.5)
        );
        assert_eq!(
            coerce_binding(&BindingValue::typed("true", xsd::BOOLEAN), None, &ns),
            json!(true)
        );
        let blank = BindingValue {
            term_type: "bnode".into(),
            ..BindingValue::literal("b0")
        };
        assert_eq!(coerce_binding(&blank, None, &ns), json!("_:b0"));
    }

    #[test]
    fn test_decode_single_entity_rows() {
        let ns = ns();
        let coll = CollConstr::single(EntConstr::new(0, schema()));
        let compiled = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap();
        let results = SelectResults {
            bindings: vec![row(&[
                ("eIri0", BindingValue::uri("http://example.org/t1")),
                ("name0", BindingValue::literal("first")),
                ("count0", BindingValue::typed("3", xsd::INTEGER)),
                ("owner0", BindingValue::uri("http://example.org/alice")),
            ])],
        };
        let objs = decode_bindings(&results, &coll.entities, &compiled.entities, &ns);
        assert_eq!(
            JsonValue::Object(objs[0].clone()),
            json!({"@id": "ex:t1", "name": "first", "count": 3, "owner": "ex:alice"})
        );
    }

    #[test]
    fn test_pinned_id_is_filled_in() {
        let ns = ns();
        let ent = EntConstr::new(0, schema())
            .with_condition("@id", Condition::Value(json!("http://example.org/t1")));
        let coll = CollConstr::single(ent);
        let compiled = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap();
        let results = SelectResults {
            bindings: vec![row(&[("name0", BindingValue::literal("first"))])],
        };
        let objs = decode_bindings(&results, &coll.entities, &compiled.entities, &ns);
        assert_eq!(objs[0].get("@id"), Some(&json!("ex:t1")));
        assert_eq!(objs[0].get("name"), Some(&json!("first")));
    }

    #[test]
    fn test_shared_variable_decodes_in_every_entity() {
        let ns = ns();
        let mut owner = EntConstr::new(0, schema()).with_condition("owner", Condition::VarRef("who".into()));
        owner.variables = Some(vec!["@id".into(), "name".into(), "who".into()]);
        let owned = EntConstr::new(1, schema()).with_condition("@id", Condition::VarRef("who".into()));
        let mut coll = CollConstr::single(owner);
        coll.entities.push(owned);
        let compiled = compile_select(&coll, &ns, &CompilerConfig::default()).unwrap();
        let results = SelectResults {
            bindings: vec![row(&[
                ("eIri0", BindingValue::uri("http://example.org/t1")),
                ("name0", BindingValue::literal("first")),
                ("who", BindingValue::uri("http://example.org/alice")),
                ("name1", BindingValue::literal("boss")),
            ])],
        };
        let objs = decode_bindings(&results, &coll.entities, &compiled.entities, &ns);
        assert_eq!(objs[0].get("who"), Some(&json!("ex:alice")));
        assert_eq!(objs[0].get("@id1"), Some(&json!("ex:alice")));
        assert_eq!(objs[0].get("name1"), Some(&json!("boss")));
    }

    #[test]
    fn test_merge_suffixes_conflicts_and_accumulates_types() {
        let merged = merge(vec![
            json!({"@id": "ex:a", "@type": "ex:A", "name": "x"}).as_object().cloned().unwrap(),
            json!({"@type": "ex:B", "name": "y", "label": "l"}).as_object().cloned().unwrap(),
            json!({"name": "x"}).as_object().cloned().unwrap(),
        ]);
        assert_eq!(
            JsonValue::Object(merged),
            json!({"@id": "ex:a", "@type": ["ex:A", "ex:B"], "name": "x", "name1": "y", "label": "l"})
        );
    }
}
