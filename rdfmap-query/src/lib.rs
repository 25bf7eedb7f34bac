//! Schema-shaped object queries over SPARQL endpoints
//!
//! A collection constraint names one or more entity schemas, the conditions
//! their properties must satisfy and the data to write. This crate compiles
//! such constraints into SPARQL (SELECT, CONSTRUCT and UPDATE), runs them
//! through an injected [`SparqlClient`] and decodes the answers into plain
//! JSON objects keyed by schema property names.
//!
//! Compilation is pure: the `compile_*` functions return query ASTs together
//! with the per-entity variable maps needed to decode results. The
//! [`ObjectMapper`] wraps them with the client round trip.
//!
//! # Example
//!
//! ```
//! use rdfmap_query::{compile_select, CollConstr, CompilerConfig, StaticSchemaProvider};
//! use rdfmap_vocab::NamespaceMap;
//! use serde_json::json;
//!
//! let schemas = StaticSchemaProvider::new().with_schema(
//!     serde_json::from_value(json!({
//!         "@id": "ex:PersonShape",
//!         "targetClass": "ex:Person",
//!         "@context": {"name": "ex:name"},
//!         "properties": {
//!             "@id": {"type": "string", "format": "iri"},
//!             "name": {"type": "string"}
//!         },
//!         "required": ["@id", "name"]
//!     }))
//!     .unwrap(),
//! );
//! let ns = NamespaceMap::with_defaults().with_prefix("ex", "http://example.org/");
//! let config = CompilerConfig::default();
//! let coll = CollConstr::from_value(
//!     &json!({"entConstrs": [{"schema": "ex:PersonShape", "conditions": {"name": "Ann"}}]}),
//!     &schemas,
//!     &config,
//! )
//! .unwrap();
//! let query = compile_select(&coll, &ns, &config).unwrap().to_sparql(&ns, &config);
//! assert!(query.contains("FILTER(?name0 = \"Ann\")"));
//! ```

pub mod array;
pub mod client;
pub mod config;
pub mod constraint;
pub mod construct;
pub mod decode;
pub mod entity;
pub mod error;
pub mod execute;
pub mod filter;
pub mod hierarchy;
pub mod literal;
pub mod schema;
pub mod select;
pub mod update;
pub mod vars;

pub use array::{collect_array, compile_array_followup, ArrayFollowup};
pub use client::{
    BindingValue, ClientError, QueryParams, SchemaProvider, SelectResults, SparqlClient,
    StaticSchemaProvider,
};
pub use config::{CompilerConfig, DEFAULT_LOCAL_URN_PREFIX};
pub use constraint::{
    BindRelation, BindTriple, CollConstr, CollConstrJson, Condition, EntConstr, EntConstrJson,
    OrderKey, Relation,
};
pub use construct::{compile_construct, CompiledConstruct};
pub use decode::{collection_context, decode_bindings, decode_graph};
pub use entity::{compile_entity, CompileOptions, EntityFragment};
pub use error::{QueryError, Result};
pub use execute::ObjectMapper;
pub use schema::{EntitySchema, Predicate, PropertySchema, ValueKind};
pub use select::{compile_select, CompiledSelect};
pub use update::{compile_delete, compile_insert, compile_update};
pub use vars::{PropVarMap, VarAllocator};
