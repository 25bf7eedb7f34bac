//! Minimal JSON-LD processing for rdfmap
//!
//! This library provides the pieces the graph result decoder needs:
//! - Context parsing and serialization
//! - IRI expansion and longest-prefix compaction
//! - RDF/JS quads grouped into flat node maps
//! - Per-node compaction against a context
//!
//! # Example
//!
//! ```
//! use rdfmap_json_ld::{parse_context, ContextCompactor, NodeMap, Quad, QuadTerm};
//! use serde_json::json;
//!
//! let ctx = parse_context(&json!({
//!     "ex": "http://example.org/",
//!     "name": "ex:name"
//! })).unwrap();
//!
//! let quads = vec![Quad::new(
//!     QuadTerm::named("http://example.org/alice"),
//!     QuadTerm::named("http://example.org/name"),
//!     QuadTerm::literal("Alice", None),
//! )];
//! let nodes = NodeMap::from_quads(&quads).unwrap();
//! let compactor = ContextCompactor::new(&ctx);
//! let alice = nodes.get("http://example.org/alice").unwrap().compact(&ctx, &compactor);
//! assert_eq!(alice["@id"], json!("ex:alice"));
//! assert_eq!(alice["name"], json!("Alice"));
//! ```

pub mod compact;
pub mod context;
pub mod error;
pub mod iri;
pub mod node;
pub mod quad;

pub use compact::ContextCompactor;
pub use context::{Container, ContextEntry, ParsedContext, TypeValue};
pub use error::{JsonLdError, Result};
pub use node::{FlatNode, NodeMap, NodeValue};
pub use quad::{NamedNodeRef, Quad, QuadTerm, TermType};

use serde_json::Value as JsonValue;

/// Parse a JSON-LD context.
pub fn parse_context(context: &JsonValue) -> Result<ParsedContext> {
    ParsedContext::parse(None, context)
}

/// Parse a context with a base context.
pub fn parse_context_with_base(base: &ParsedContext, context: &JsonValue) -> Result<ParsedContext> {
    ParsedContext::parse(Some(base), context)
}

/// Expand an IRI against a context (vocab semantics).
pub fn expand_iri(iri: &str, context: &ParsedContext) -> String {
    iri::expand_iri(iri, context, true)
}

