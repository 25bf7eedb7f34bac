//! Array-property expansion.
//!
//! Array properties multiply result rows, so the main query leaves them out
//! and each (object, array key) pair gets its own follow-up SELECT over a
//! synthetic two-property schema with the subject pinned. The bindings of a
//! follow-up collapse into one JSON array.

use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, Condition, EntConstr};
use crate::entity::CompileOptions;
use crate::error::Result;
use crate::schema::{EntitySchema, PropertySchema};
use crate::select::{compile_select_with, CompiledSelect};
use rdfmap_vocab::NamespaceMap;
use serde_json::{Map, Value as JsonValue};

/// Schema holding only `@id` and `key` of `parent`.
fn followup_schema(parent: &EntitySchema, key: &str) -> EntitySchema {
    let mut schema = EntitySchema {
        id: format!("{}#{}", parent.id, key),
        context: parent.context.clone(),
        required: vec![key.to_string()],
        ..Default::default()
    };
    schema.properties.insert(
        "@id".to_string(),
        parent
            .property("@id")
            .cloned()
            .unwrap_or_else(|| PropertySchema::of_type("string").with_format("iri")),
    );
    if let Some(prop) = parent.property(key) {
        schema.properties.insert(key.to_string(), prop.clone());
    }
    schema
}

/// A follow-up query together with the constraint it was compiled from.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayFollowup {
    pub constraint: CollConstr,
    pub select: CompiledSelect,
}

impl ArrayFollowup {
    pub fn to_sparql(&self, ns: &NamespaceMap, config: &CompilerConfig) -> String {
        self.select.to_sparql(ns, config)
    }
}

/// Follow-up SELECT fetching every value of `key` for the resource `parent_id`.
pub fn compile_array_followup(
    parent: &EntConstr,
    key: &str,
    parent_id: &str,
    ns: &NamespaceMap,
    config: &CompilerConfig,
) -> Result<ArrayFollowup> {
    let mut ent = EntConstr::new(0, followup_schema(&parent.schema, key))
        .with_condition("@id", Condition::Value(JsonValue::String(parent_id.to_string())));
    ent.variables = Some(vec![key.to_string()]);
    ent.service = parent.service.clone();
    let constraint = CollConstr::single(ent);
    let select = compile_select_with(
        &constraint,
        ns,
        config,
        CompileOptions {
            defer_arrays: false,
        },
    )?;
    Ok(ArrayFollowup { constraint, select })
}

/// Collect the values of `key` across decoded follow-up rows.
pub fn collect_array(rows: &[Map<String, JsonValue>], key: &str) -> JsonValue {
    let mut values = Vec::new();
    for row in rows {
        if let Some(v) = row.get(key) {
            if !values.contains(v) {
                values.push(v.clone());
            }
        }
    }
    JsonValue::Array(values)
}
