//! Triple and graph patterns.
//!
//! A WHERE clause is a flat list of [`GraphPattern`]s rendered in order.
//! The compiler relies on that order: mandatory BGPs first, then OPTIONAL
//! blocks, then FILTER and BIND.

use super::expr::Expression;
use super::path::PropertyPath;
use super::query::SelectQuery;
use super::term::{Iri, Term, Var};

/// The predicate position of a triple pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateTerm {
    Var(Var),
    Iri(Iri),
    Path(PropertyPath),
}

impl From<Var> for PredicateTerm {
    fn from(v: Var) -> Self {
        PredicateTerm::Var(v)
    }
}

impl From<Iri> for PredicateTerm {
    fn from(i: Iri) -> Self {
        PredicateTerm::Iri(i)
    }
}

impl From<PropertyPath> for PredicateTerm {
    fn from(p: PropertyPath) -> Self {
        match p {
            PropertyPath::Iri(i) => PredicateTerm::Iri(i),
            other => PredicateTerm::Path(other),
        }
    }
}

/// A triple pattern (subject, predicate, object).
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: PredicateTerm,
    pub object: Term,
}

impl TriplePattern {
    pub fn new(subject: Term, predicate: impl Into<PredicateTerm>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    /// `subject rdf:type class`
    pub fn rdf_type(subject: Term, class: Term) -> Self {
        Self::new(subject, Iri::rdf_type(), class)
    }

    /// Iterate the variables this pattern mentions, in s/p/o order.
    pub fn variables(&self) -> impl Iterator<Item = &Var> {
        let p = match &self.predicate {
            PredicateTerm::Var(v) => Some(v),
            _ => None,
        };
        self.subject
            .as_var()
            .into_iter()
            .chain(p)
            .chain(self.object.as_var())
    }
}

/// A graph pattern in a WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphPattern {
    /// Basic graph pattern (sequence of triples)
    Bgp(Vec<TriplePattern>),

    /// OPTIONAL { patterns }
    Optional(Vec<GraphPattern>),

    /// FILTER(expr)
    Filter(Expression),

    /// BIND(expr AS ?var)
    Bind { expr: Expression, var: Var },

    /// Group graph pattern `{ ... }`
    Group(Vec<GraphPattern>),

    /// SERVICE [SILENT] <endpoint> { patterns }
    Service {
        endpoint: Iri,
        silent: bool,
        patterns: Vec<GraphPattern>,
    },

    /// Nested `{ SELECT ... }`
    Subquery(Box<SelectQuery>),
}

impl GraphPattern {
    /// A BGP holding a single triple.
    pub fn triple(t: TriplePattern) -> Self {
        GraphPattern::Bgp(vec![t])
    }

    /// `OPTIONAL { t . }`
    pub fn optional_triple(t: TriplePattern) -> Self {
        GraphPattern::Optional(vec![GraphPattern::triple(t)])
    }

    pub fn filter(expr: Expression) -> Self {
        GraphPattern::Filter(expr)
    }

    pub fn service(endpoint: impl AsRef<str>, patterns: Vec<GraphPattern>) -> Self {
        GraphPattern::Service {
            endpoint: Iri::new(endpoint),
            silent: false,
            patterns,
        }
    }

    /// Check if this is an empty BGP.
    pub fn is_empty_bgp(&self) -> bool {
        matches!(self, GraphPattern::Bgp(triples) if triples.is_empty())
    }
}
