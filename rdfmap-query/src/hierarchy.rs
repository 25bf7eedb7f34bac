//! Type constraints: exact class membership, or the most specific subtype.
//!
//! With type resolution the entity is matched through any subclass of its
//! target class, and only the most specific of its asserted types is bound:
//!
//! ```sparql
//! ?eIri0 rdf:type ?type0 .
//! FILTER NOT EXISTS { ?subtype0 ^rdf:type ?eIri0 . ?subtype0 rdfs:subClassOf ?type0 . FILTER(?subtype0 != ?type0) }
//! FILTER EXISTS { ?type0 rdfs:subClassOf* ?supertype0 . FILTER(?supertype0 = rm:Artifact) }
//! ```

use crate::vars::VarAllocator;
use rdfmap_sparql::ast::{
    Expression, GraphPattern, Iri, PropertyPath, Term, TriplePattern, Var,
};
use rdfmap_vocab::{rdf, rdfs};

/// Patterns binding the most specific type of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MostSpecificType {
    pub type_var: Var,
    /// `S rdf:type ?type`
    pub type_triple: TriplePattern,
    pub filters: Vec<Expression>,
}

/// `subject rdf:type <class>`
pub fn exact_type(subject: &Term, class: &str) -> TriplePattern {
    TriplePattern::rdf_type(subject.clone(), Term::iri(class))
}

/// Most-specific-type patterns for entity `index` under `target_class`.
pub fn most_specific_type(
    subject: &Term,
    target_class: Option<&str>,
    index: usize,
    alloc: &mut VarAllocator,
) -> MostSpecificType {
    let type_var = alloc.alloc_or_join(&format!("type{}", index));
    let subtype_var = alloc.alloc_or_join(&format!("subtype{}", index));

    let type_triple = TriplePattern::rdf_type(subject.clone(), Term::Var(type_var.clone()));

    let no_narrower_type = Expression::NotExists(vec![
        GraphPattern::Bgp(vec![
            TriplePattern::new(
                Term::Var(subtype_var.clone()),
                PropertyPath::inverse(PropertyPath::iri(rdf::TYPE)),
                subject.clone(),
            ),
            TriplePattern::new(
                Term::Var(subtype_var.clone()),
                Iri::new(rdfs::SUB_CLASS_OF),
                Term::Var(type_var.clone()),
            ),
        ]),
        GraphPattern::filter(Expression::ne(
            Expression::Var(subtype_var),
            Expression::Var(type_var.clone()),
        )),
    ]);
    let mut filters = vec![no_narrower_type];

    if let Some(class) = target_class {
        let supertype_var = alloc.alloc_or_join(&format!("supertype{}", index));
        filters.push(Expression::Exists(vec![
            GraphPattern::triple(TriplePattern::new(
                Term::Var(type_var.clone()),
                PropertyPath::zero_or_more(PropertyPath::iri(rdfs::SUB_CLASS_OF)),
                Term::Var(supertype_var.clone()),
            )),
            GraphPattern::filter(Expression::eq(
                Expression::Var(supertype_var),
                Expression::iri(class),
            )),
        ]));
    }

    MostSpecificType {
        type_var,
        type_triple,
        filters,
    }
}
