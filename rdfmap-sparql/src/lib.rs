//! # rdfmap SPARQL
//!
//! The output side of the query compiler: a typed AST for the subset of
//! SPARQL 1.1 the compiler emits, and a serializer that renders it to query
//! text.
//!
//! ## Architecture
//!
//! 1. **Build**: the compiler assembles [`ast::SelectQuery`],
//!    [`ast::ConstructQuery`] or [`ast::UpdateRequest`] values.
//! 2. **Render**: [`ToSparql::to_sparql`] walks the AST, compacts IRIs
//!    against a [`NamespaceMap`](rdfmap_vocab::NamespaceMap) and prepends a
//!    `PREFIX` line for every prefix it actually used.
//!
//! ## Quick Start
//!
//! ```
//! use rdfmap_sparql::ast::{GraphPattern, Iri, SelectQuery, Term, TriplePattern, Var};
//! use rdfmap_sparql::ToSparql;
//! use rdfmap_vocab::NamespaceMap;
//!
//! let ns = NamespaceMap::new().with_prefix("ex", "http://example.org/");
//! let query = SelectQuery::new(
//!     vec![Var::new("s")],
//!     vec![GraphPattern::Bgp(vec![TriplePattern::new(
//!         Term::var("s"),
//!         Iri::new("http://example.org/name"),
//!         Term::var("name"),
//!     )])],
//! );
//! let text = query.to_sparql(&ns);
//! assert!(text.starts_with("PREFIX ex: <http://example.org/>"));
//! assert!(text.contains("?s ex:name ?name ."));
//! ```

pub mod ast;
pub mod render;

pub use ast::{Query, SelectQuery, UpdateOperation, UpdateRequest};
pub use render::{RenderOptions, Serializer, ToSparql};
