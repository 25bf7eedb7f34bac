//! SPARQL Abstract Syntax Tree types for query generation.
//!
//! ## Module Structure
//!
//! - [`term`]: variables, IRIs, literals, blank nodes
//! - [`path`]: property path expressions (inverse, transitive)
//! - [`expr`]: FILTER/BIND expressions
//! - [`pattern`]: triple patterns and graph patterns (BGP, OPTIONAL, SERVICE, ...)
//! - [`query`]: SELECT and CONSTRUCT forms with solution modifiers
//! - [`update`]: INSERT DATA and DELETE/INSERT/WHERE

pub mod expr;
pub mod path;
pub mod pattern;
pub mod query;
pub mod term;
pub mod update;

pub use expr::{BinaryOp, Expression, FunctionName, UnaryOp};
pub use path::PropertyPath;
pub use pattern::{GraphPattern, PredicateTerm, TriplePattern};
pub use query::{
    ConstructQuery, OrderCondition, OrderDirection, Query, SelectModifier, SelectQuery,
    SelectVariables, SolutionModifiers,
};
pub use term::{Iri, Literal, Term, Var};
pub use update::{Modify, UpdateOperation, UpdateRequest};
