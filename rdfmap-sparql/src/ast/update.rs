//! SPARQL Update AST types.
//!
//! This module defines the update operations the compiler emits:
//! - INSERT DATA
//! - DELETE/INSERT with WHERE (Modify operation)

use super::pattern::{GraphPattern, TriplePattern};

/// A SPARQL Update operation.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    /// INSERT DATA { triples }
    InsertData(Vec<TriplePattern>),
    /// DELETE/INSERT with WHERE clause
    Modify(Box<Modify>),
}

/// DELETE/INSERT operation with WHERE clause.
///
/// ```sparql
/// DELETE { ?s <p> ?old }
/// INSERT { ?s <p> "new" }
/// WHERE { ?s <p> ?old }
/// ```
///
/// An empty `delete` or `insert` template is omitted when rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Modify {
    /// DELETE template
    pub delete: Vec<TriplePattern>,
    /// INSERT template
    pub insert: Vec<TriplePattern>,
    /// WHERE clause patterns
    pub where_clause: Vec<GraphPattern>,
}

impl Modify {
    pub fn new(
        delete: Vec<TriplePattern>,
        insert: Vec<TriplePattern>,
        where_clause: Vec<GraphPattern>,
    ) -> Self {
        Self {
            delete,
            insert,
            where_clause,
        }
    }
}

impl From<Modify> for UpdateOperation {
    fn from(m: Modify) -> Self {
        UpdateOperation::Modify(Box::new(m))
    }
}

/// A request of one or more operations, rendered separated by `;`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateRequest {
    pub operations: Vec<UpdateOperation>,
}

impl UpdateRequest {
    pub fn new(operations: Vec<UpdateOperation>) -> Self {
        Self { operations }
    }

    pub fn push(&mut self, op: impl Into<UpdateOperation>) {
        self.operations.push(op.into());
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
