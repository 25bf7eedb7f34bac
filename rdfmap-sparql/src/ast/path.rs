//! SPARQL Property Path types.
//!
//! | Syntax | Name | Description |
//! |--------|------|-------------|
//! | `iri` | Link | Direct predicate |
//! | `^iri` | Inverse | Reverse direction |
//! | `p*` | Zero or more | Transitive closure |

use super::term::Iri;

/// A property path expression in the predicate position of a triple pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyPath {
    /// Simple predicate (an IRI)
    Iri(Iri),
    /// Inverse path: `^path`
    Inverse(Box<PropertyPath>),
    /// Zero or more: `path*`
    ZeroOrMore(Box<PropertyPath>),
}

impl PropertyPath {
    /// Create a simple IRI path.
    pub fn iri(iri: impl AsRef<str>) -> Self {
        PropertyPath::Iri(Iri::new(iri))
    }

    /// Create an inverse path.
    pub fn inverse(path: PropertyPath) -> Self {
        PropertyPath::Inverse(Box::new(path))
    }

    /// Create a zero-or-more path.
    pub fn zero_or_more(path: PropertyPath) -> Self {
        PropertyPath::ZeroOrMore(Box::new(path))
    }

    /// Check if this is a simple path (just an IRI).
    pub fn is_simple(&self) -> bool {
        matches!(self, PropertyPath::Iri(_))
    }
}
