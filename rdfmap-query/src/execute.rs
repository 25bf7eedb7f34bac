//! Async operations: compile, run against the client, decode.
//!
//! A `MalformedConstraint` found while building or compiling ends the
//! operation with an empty result and a warning; no query is issued. Every
//! other error is returned.

use crate::array::{collect_array, compile_array_followup};
use crate::client::{QueryParams, SchemaProvider, SparqlClient};
use crate::config::CompilerConfig;
use crate::constraint::{CollConstr, CollConstrJson, Condition, EntConstr};
use crate::construct::compile_construct;
use crate::decode::{decode_bindings, decode_graph_nodes};
use crate::entity::EntityFragment;
use crate::error::{QueryError, Result};
use crate::select::compile_select;
use crate::update::{compile_delete, compile_insert, compile_update};
use futures::stream::{self, StreamExt, TryStreamExt};
use rdfmap_sparql::{ToSparql, UpdateRequest};
use rdfmap_vocab::NamespaceMap;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, debug_span, field, warn, Instrument};

type Object = Map<String, JsonValue>;

type UpdateCompiler = fn(&CollConstr, &NamespaceMap, &CompilerConfig) -> Result<UpdateRequest>;

/// Downgrade a malformed constraint to "nothing to do".
fn or_empty<T>(result: Result<T>, operation: &'static str) -> Result<Option<T>> {
    match result {
        Err(QueryError::MalformedConstraint {
            entity,
            key,
            reason,
        }) => {
            warn!(
                operation,
                entity,
                key = %key,
                reason = %reason,
                "malformed constraint, no query issued"
            );
            Ok(None)
        }
        other => other.map(Some),
    }
}

/// Maps collection constraints to queries against one endpoint.
pub struct ObjectMapper<C, P> {
    client: C,
    schemas: P,
    ns: NamespaceMap,
    config: CompilerConfig,
}

impl<C: SparqlClient, P: SchemaProvider> ObjectMapper<C, P> {
    pub fn new(client: C, schemas: P, ns: NamespaceMap) -> Self {
        Self {
            client,
            schemas,
            ns,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn schemas(&self) -> &P {
        &self.schemas
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.ns
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn build(&self, json: &CollConstrJson) -> Result<CollConstr> {
        CollConstr::build(json, &self.schemas, &self.config)
    }

    /// Run a SELECT and return one object per solution row.
    pub async fn select_objects(&self, json: &CollConstrJson) -> Result<Vec<Object>> {
        let prepared = self.build(json).and_then(|coll| {
            let compiled = compile_select(&coll, &self.ns, &self.config)?;
            Ok((coll, compiled))
        });
        let Some((coll, compiled)) = or_empty(prepared, "select")? else {
            return Ok(Vec::new());
        };

        let span = debug_span!(
            "select_objects",
            collection = %coll.label(),
            entities = coll.entities.len(),
            rows = field::Empty
        );
        async {
            let query = compiled.to_sparql(&self.ns, &self.config);
            debug!(query = %query, "issuing select");
            let results = self.client.sparql_select(&query, &coll.options).await?;
            let mut objects = decode_bindings(&results, &coll.entities, &compiled.entities, &self.ns);
            tracing::Span::current().record("rows", objects.len() as u64);
            let subjects: Vec<Option<String>> = objects
                .iter()
                .map(|obj| {
                    obj.get("@id")
                        .and_then(JsonValue::as_str)
                        .map(|id| self.ns.de_abbreviate(id))
                })
                .collect();
            self.expand_arrays(&coll, &compiled.entities, &mut objects, &subjects)
                .await?;
            Ok::<_, QueryError>(objects)
        }
        .instrument(span)
        .await
    }

    /// Run a CONSTRUCT and return the root entity's objects with nested references.
    pub async fn construct_objects(&self, json: &CollConstrJson) -> Result<Vec<Object>> {
        let prepared = self.build(json).and_then(|coll| {
            let compiled = compile_construct(&coll, &self.ns, &self.config)?;
            Ok((coll, compiled))
        });
        let Some((coll, compiled)) = or_empty(prepared, "construct")? else {
            return Ok(Vec::new());
        };

        let span = debug_span!(
            "construct_objects",
            collection = %coll.label(),
            entities = coll.entities.len(),
            quads = field::Empty,
            objects = field::Empty
        );
        async {
            let span = tracing::Span::current();
            let query = compiled.to_sparql(&self.ns, &self.config);
            debug!(query = %query, "issuing construct");
            let quads = self.client.sparql_construct(&query, &coll.options).await?;
            span.record("quads", quads.len() as u64);

            let pinned = matches!(
                coll.root().and_then(|r| r.condition("@id")),
                Some(Condition::Value(_))
            );
            if quads.is_empty() && pinned {
                return Err(QueryError::EmptyConstructResult {
                    collection: coll.label(),
                });
            }

            let (subjects, mut objects): (Vec<_>, Vec<_>) =
                decode_graph_nodes(&quads, &coll, &compiled.entities, &self.ns, &self.config)?
                    .into_iter()
                    .map(|(id, obj)| (Some(id), obj))
                    .unzip();
            span.record("objects", objects.len() as u64);
            self.expand_arrays(&coll, &compiled.entities, &mut objects, &subjects)
                .await?;
            Ok::<_, QueryError>(objects)
        }
        .instrument(span)
        .await
    }

    /// Insert every entity's `data`; returns the endpoint's response.
    pub async fn insert_objects(&self, json: &CollConstrJson) -> Result<JsonValue> {
        self.run_update(json, "insert", compile_insert).await
    }

    /// Overwrite the properties present in each entity's `data`.
    pub async fn update_objects(&self, json: &CollConstrJson) -> Result<JsonValue> {
        self.run_update(json, "update", compile_update).await
    }

    /// Delete every triple of the matched resources.
    pub async fn delete_objects(&self, json: &CollConstrJson) -> Result<JsonValue> {
        self.run_update(json, "delete", compile_delete).await
    }

    async fn run_update(
        &self,
        json: &CollConstrJson,
        kind: &'static str,
        compile: UpdateCompiler,
    ) -> Result<JsonValue> {
        let prepared = self.build(json).and_then(|coll| {
            let request = compile(&coll, &self.ns, &self.config)?;
            Ok((coll, request))
        });
        let Some((coll, request)) = or_empty(prepared, kind)? else {
            return Ok(JsonValue::Null);
        };

        let span = debug_span!(
            "update_objects",
            kind,
            collection = %coll.label(),
            entities = coll.entities.len()
        );
        async {
            let update = request.to_sparql_with(&self.ns, self.config.render_options());
            debug!(update = %update, "issuing update");
            let response = self.client.sparql_update(&update, &coll.options).await?;
            Ok::<_, QueryError>(response)
        }
        .instrument(span)
        .await
    }

    /// Fill the root entity's deferred array properties, one follow-up per
    /// (object, key), in object order.
    ///
    /// `subjects[row]` is the full IRI of `objects[row]`; blank nodes get no
    /// follow-up.
    async fn expand_arrays(
        &self,
        coll: &CollConstr,
        fragments: &[EntityFragment],
        objects: &mut [Object],
        subjects: &[Option<String>],
    ) -> Result<()> {
        let (Some(root), Some(frag)) = (coll.root(), fragments.first()) else {
            return Ok(());
        };
        if frag.arrays.is_empty() {
            return Ok(());
        }

        let mut jobs = Vec::new();
        for (row, subject) in subjects.iter().enumerate() {
            let Some(id) = subject.as_deref().filter(|id| !id.starts_with("_:")) else {
                continue;
            };
            for key in &frag.arrays {
                jobs.push((row, key.clone(), id.to_string()));
            }
        }

        let span = debug_span!(
            "expand_arrays",
            followups = jobs.len(),
            concurrency = self.config.array_fetch_concurrency
        );
        let fetched: Vec<(usize, String, JsonValue)> = stream::iter(jobs)
            .map(|(row, key, id)| async move {
                let values = self.fetch_array(root, &key, &id, &coll.options).await?;
                Ok::<_, QueryError>((row, key, values))
            })
            .buffered(self.config.array_fetch_concurrency.max(1))
            .try_collect()
            .instrument(span)
            .await?;

        for (row, key, values) in fetched {
            objects[row].insert(key, values);
        }
        Ok(())
    }

    async fn fetch_array(
        &self,
        parent: &EntConstr,
        key: &str,
        id: &str,
        params: &QueryParams,
    ) -> Result<JsonValue> {
        let followup = compile_array_followup(parent, key, id, &self.ns, &self.config)?;
        let query = followup.to_sparql(&self.ns, &self.config);
        debug!(key, id, query = %query, "issuing array follow-up");
        let results = self.client.sparql_select(&query, params).await?;
        let rows = decode_bindings(
            &results,
            &followup.constraint.entities,
            &followup.select.entities,
            &self.ns,
        );
        Ok(collect_array(&rows, key))
    }
}
