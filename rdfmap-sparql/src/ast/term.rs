//! SPARQL term types.
//!
//! These types represent the different kinds of terms that can appear
//! in generated queries: variables, IRIs, literals, and blank nodes.
//! IRIs are always held in expanded form; compaction happens at render time.

use std::fmt;
use std::sync::Arc;

/// A SPARQL variable (e.g., `?name`).
///
/// The name does not include the leading `?`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    /// Variable name (without the `?` prefix)
    pub name: Arc<str>,
}

impl Var {
    /// Create a new variable. A leading `?` or `$` is stripped.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let name = name
            .strip_prefix('?')
            .or_else(|| name.strip_prefix('$'))
            .unwrap_or(name);
        Self {
            name: Arc::from(name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

/// An expanded IRI reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(pub Arc<str>);

impl Iri {
    pub fn new(iri: impl AsRef<str>) -> Self {
        Self(Arc::from(iri.as_ref()))
    }

    /// Reference to `rdf:type`.
    pub fn rdf_type() -> Self {
        Self::new(rdfmap_vocab::rdf::TYPE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A literal value.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// Simple string literal (no language tag or datatype)
    Simple(Arc<str>),
    /// Language-tagged string (e.g., `"hello"@en`)
    LangTagged {
        /// The string value
        value: Arc<str>,
        /// The language tag (e.g., "en", "en-US")
        lang: Arc<str>,
    },
    /// Typed literal (e.g., `"42"^^xsd:integer`)
    Typed {
        /// The lexical form
        value: Arc<str>,
        /// The datatype IRI
        datatype: Iri,
    },
    /// Boolean literal (`true` or `false`)
    Boolean(bool),
}

impl Literal {
    /// Create a simple string literal.
    pub fn string(value: impl AsRef<str>) -> Self {
        Literal::Simple(Arc::from(value.as_ref()))
    }

    /// Create a language-tagged string.
    pub fn lang_string(value: impl AsRef<str>, lang: impl AsRef<str>) -> Self {
        Literal::LangTagged {
            value: Arc::from(value.as_ref()),
            lang: Arc::from(lang.as_ref()),
        }
    }

    /// Create a typed literal with an expanded datatype IRI.
    pub fn typed(value: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Literal::Typed {
            value: Arc::from(value.as_ref()),
            datatype: Iri::new(datatype),
        }
    }

    /// Create an `xsd:integer` literal.
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), rdfmap_vocab::xsd::INTEGER)
    }

    /// Create a boolean literal.
    pub fn boolean(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

/// A term in a triple pattern or expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// Variable (`?x`)
    Var(Var),
    /// IRI
    Iri(Iri),
    /// Literal value
    Literal(Literal),
    /// Labeled blank node (`_:label`)
    BlankNode(Arc<str>),
}

impl Term {
    pub fn var(name: impl AsRef<str>) -> Self {
        Term::Var(Var::new(name))
    }

    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Iri::new(iri))
    }

    pub fn literal(lit: Literal) -> Self {
        Term::Literal(lit)
    }

    /// Check if this term is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Get the variable if this is a variable term.
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Get the IRI if this is an IRI term.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(i) => Some(i),
            _ => None,
        }
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<Iri> for Term {
    fn from(i: Iri) -> Self {
        Term::Iri(i)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_strips_sigil() {
        assert_eq!(Var::new("?name").as_str(), "name");
        assert_eq!(Var::new("$name").as_str(), "name");
        assert_eq!(Var::new("name").to_string(), "?name");
    }

    #[test]
    fn test_integer_literal_is_typed() {
        match Literal::integer(3) {
            Literal::Typed { value, datatype } => {
                assert_eq!(value.as_ref(), "3");
                assert_eq!(datatype.as_str(), rdfmap_vocab::xsd::INTEGER);
            }
            other => panic!("Expected typed literal, got {:?}", other),
        }
    }

    #[test]
    fn test_term_accessors() {
        let t = Term::var("s");
        assert!(t.is_var());
        assert_eq!(t.as_var().unwrap().as_str(), "s");
        assert!(Term::iri("http://example.org/").as_iri().is_some());
        assert!(Term::literal(Literal::string("x")).as_var().is_none());
    }
}
