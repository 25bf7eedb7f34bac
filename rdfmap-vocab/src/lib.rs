//! RDF Vocabulary Constants and Namespace Resolution for rdfmap
//!
//! This crate provides a centralized location for the vocabulary IRIs the
//! query compiler emits, plus the prefix map used to shorten and expand IRIs.
//!
//! # Organization
//!
//! - `rdf` - RDF vocabulary (http://www.w3.org/1999/02/22-rdf-syntax-ns#)
//! - `rdfs` - RDFS vocabulary (http://www.w3.org/2000/01/rdf-schema#)
//! - `xsd` - XSD datatypes (http://www.w3.org/2001/XMLSchema#)
//! - `owl`, `sh`, `dcterms` - namespace stems registered by default
//! - `namespace` - `NamespaceMap` and the abbreviate/de-abbreviate resolver

pub mod namespace;

pub use namespace::{abbreviate_iri, de_abbreviate_iri, parse_prefix, NamespaceMap};

/// RDF vocabulary constants
pub mod rdf {
    /// Namespace stem
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:langString IRI
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// RDFS vocabulary constants
pub mod rdfs {
    /// Namespace stem
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

    /// rdfs:subClassOf IRI
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

    /// rdfs:label IRI
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

/// XSD vocabulary constants
pub mod xsd {
    /// Namespace stem
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";

    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:int IRI
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";

    /// xsd:long IRI
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";

    /// xsd:decimal IRI
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

    /// xsd:float IRI
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";

    /// xsd:boolean IRI
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

    /// xsd:dateTime IRI
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

    /// xsd:anyURI IRI
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";

    /// Check whether a datatype belongs to the integer family.
    ///
    /// Stores echo back whatever subtype the data was written with, so
    /// decoders treat all of these as integers.
    #[inline]
    pub fn is_integer_family(datatype_iri: &str) -> bool {
        matches!(
            datatype_iri,
            INTEGER
                | INT
                | LONG
                | "http://www.w3.org/2001/XMLSchema#short"
                | "http://www.w3.org/2001/XMLSchema#byte"
                | "http://www.w3.org/2001/XMLSchema#nonNegativeInteger"
                | "http://www.w3.org/2001/XMLSchema#positiveInteger"
                | "http://www.w3.org/2001/XMLSchema#nonPositiveInteger"
                | "http://www.w3.org/2001/XMLSchema#negativeInteger"
                | "http://www.w3.org/2001/XMLSchema#unsignedLong"
                | "http://www.w3.org/2001/XMLSchema#unsignedInt"
        )
    }

    /// Check whether a datatype is a floating point or decimal number.
    #[inline]
    pub fn is_decimal_family(datatype_iri: &str) -> bool {
        matches!(datatype_iri, DECIMAL | DOUBLE | FLOAT)
    }
}

/// OWL namespace
pub mod owl {
    /// Namespace stem
    pub const NS: &str = "http://www.w3.org/2002/07/owl#";
}

/// SHACL namespace
pub mod sh {
    /// Namespace stem
    pub const NS: &str = "http://www.w3.org/ns/shacl#";
}

/// Dublin Core terms namespace
pub mod dcterms {
    /// Namespace stem
    pub const NS: &str = "http://purl.org/dc/terms/";
}

/// Default prefix names paired with their stems.
///
/// This is the set `NamespaceMap::with_defaults()` registers.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", rdf::NS),
    ("rdfs", rdfs::NS),
    ("xsd", xsd::NS),
    ("owl", owl::NS),
    ("sh", sh::NS),
    ("dcterms", dcterms::NS),
];
