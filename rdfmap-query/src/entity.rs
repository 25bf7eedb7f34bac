//! Entity constraint compiler.
//!
//! Compiles one [`EntConstr`] into an [`EntityFragment`]: the patterns
//! selecting matching resources, plus the key ↔ variable maps the decoders
//! need to read results back. Variables come from a [`VarAllocator`] shared by
//! the whole query, so fragments of one collection never collide.
//!
//! Placement follows "narrow first, widen last": required keys and keys
//! carrying a narrowing condition are mandatory triples, every other selected
//! key is wrapped in its own OPTIONAL.

use crate::config::CompilerConfig;
use crate::constraint::{BindRelation, BindTriple, Condition, EntConstr, Relation};
use crate::error::{QueryError, Result};
use crate::filter;
use crate::hierarchy::{exact_type, most_specific_type};
use crate::literal::reference_iri;
use crate::schema::{Predicate, ValueKind};
use crate::vars::{PropVarMap, VarAllocator};
use rdfmap_sparql::ast::{
    Expression, GraphPattern, Iri, PredicateTerm, Term, TriplePattern, Var,
};
use rdfmap_vocab::NamespaceMap;
use serde_json::Value as JsonValue;
use tracing::trace;

/// Switches that differ between the main query and follow-up queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Leave array-typed properties out; they are fetched separately
    pub defer_arrays: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { defer_arrays: true }
    }
}

/// Compiled patterns and variable maps of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFragment {
    pub index: usize,
    pub subject: Term,
    /// Keys the caller asked for, in request order
    pub selected: Vec<String>,
    pub mandatory: Vec<TriplePattern>,
    /// Each becomes its own `OPTIONAL { t . }`
    pub optional: Vec<TriplePattern>,
    pub filters: Vec<Expression>,
    pub binds: Vec<(Expression, Var)>,
    /// Projected keys
    pub props: PropVarMap,
    /// Keys matched only to apply a condition
    pub hidden: PropVarMap,
    pub bind_vars: PropVarMap,
    /// Array keys left for follow-up queries
    pub arrays: Vec<String>,
    pub service: Option<Iri>,
    /// `?type{index}` when the most specific type is resolved
    pub type_var: Option<Var>,
    /// `S <urn:local:key> ?bindVar` for CONSTRUCT templates
    pub bind_template: Vec<TriplePattern>,
}

impl EntityFragment {
    pub(crate) fn new(index: usize, subject: Term) -> Self {
        Self {
            index,
            subject,
            selected: Vec::new(),
            mandatory: Vec::new(),
            optional: Vec::new(),
            filters: Vec::new(),
            binds: Vec::new(),
            props: PropVarMap::new(),
            hidden: PropVarMap::new(),
            bind_vars: PropVarMap::new(),
            arrays: Vec::new(),
            service: None,
            type_var: None,
            bind_template: Vec::new(),
        }
    }

    pub fn subject_var(&self) -> Option<&Var> {
        self.subject.as_var()
    }

    /// Variable of `key` in any of the three maps.
    pub fn var_for(&self, key: &str) -> Option<&Var> {
        self.props
            .var(key)
            .or_else(|| self.bind_vars.var(key))
            .or_else(|| self.hidden.var(key))
    }

    /// Projected variables: properties, then binds.
    pub fn projection(&self) -> impl Iterator<Item = &Var> {
        self.props.vars().chain(self.bind_vars.vars())
    }

    pub fn optional_patterns(&self) -> impl Iterator<Item = GraphPattern> + '_ {
        self.optional
            .iter()
            .cloned()
            .map(GraphPattern::optional_triple)
    }

    pub fn filter_patterns(&self) -> impl Iterator<Item = GraphPattern> + '_ {
        self.filters.iter().cloned().map(GraphPattern::filter)
    }

    pub fn bind_patterns(&self) -> impl Iterator<Item = GraphPattern> + '_ {
        self.binds.iter().map(|(expr, var)| GraphPattern::Bind {
            expr: expr.clone(),
            var: var.clone(),
        })
    }

    /// All patterns of this entity alone, mandatory first.
    pub fn patterns(&self) -> Vec<GraphPattern> {
        let mut out = Vec::new();
        if !self.mandatory.is_empty() {
            out.push(GraphPattern::Bgp(self.mandatory.clone()));
        }
        out.extend(self.optional_patterns());
        out.extend(self.filter_patterns());
        out.extend(self.bind_patterns());
        out
    }

    /// Every variable the patterns bind, first-seen order.
    pub fn bound_vars(&self) -> Vec<Var> {
        let mut vars: Vec<Var> = Vec::new();
        let triples = self.mandatory.iter().chain(self.optional.iter());
        for v in triples.flat_map(TriplePattern::variables) {
            if !vars.contains(v) {
                vars.push(v.clone());
            }
        }
        for (_, v) in &self.binds {
            if !vars.contains(v) {
                vars.push(v.clone());
            }
        }
        vars
    }

    /// CONSTRUCT template triples.
    pub fn template(&self) -> Vec<TriplePattern> {
        self.mandatory
            .iter()
            .chain(self.optional.iter())
            .chain(self.bind_template.iter())
            .cloned()
            .collect()
    }
}

/// Keys an entity selects: the explicit list, or `@id` plus every schema key but `@type`.
pub fn selected_keys(ent: &EntConstr) -> Vec<String> {
    match &ent.variables {
        Some(keys) => keys.clone(),
        None => std::iter::once("@id".to_string())
            .chain(
                ent.schema
                    .properties
                    .keys()
                    .filter(|k| *k != "@id" && *k != "@type")
                    .cloned(),
            )
            .collect(),
    }
}

/// Reserve every variable named by a `?var` reference before compiling.
pub fn reserve_shared(entities: &[EntConstr], alloc: &mut VarAllocator) {
    for ent in entities {
        for cond in ent.conditions.values() {
            match cond {
                Condition::VarRef(name) => {
                    alloc.reserve(name);
                }
                Condition::Bind { triples, .. } => {
                    for t in triples {
                        for pos in [&t.subject, &t.predicate, &t.object] {
                            if let Some(name) = pos.strip_prefix('?') {
                                alloc.reserve(name);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Subject of an entity: pinned IRI, shared variable, or `?eIri{index}`.
pub(crate) fn subject_term(ent: &EntConstr, ns: &NamespaceMap, alloc: &mut VarAllocator) -> Result<Term> {
    match ent.condition("@id") {
        Some(Condition::VarRef(name)) => return Ok(Term::Var(alloc.reserve(name))),
        Some(Condition::Value(v)) => {
            return reference_iri(v)
                .map(|iri| Term::iri(ns.de_abbreviate(iri)))
                .ok_or_else(|| QueryError::malformed(ent.index, "@id", "expected an IRI"));
        }
        _ => {}
    }
    if let Some(iri) = ent.data.get("@id").and_then(JsonValue::as_str) {
        return Ok(Term::iri(ns.de_abbreviate(iri)));
    }
    Ok(Term::Var(alloc.alloc_or_join(&format!("eIri{}", ent.index))))
}

/// Class an entity is restricted to: an `@type` condition or the target class.
pub(crate) fn entity_class(ent: &EntConstr, ns: &NamespaceMap) -> Option<String> {
    match ent.condition("@type") {
        Some(Condition::Value(v)) => reference_iri(v).map(|c| ns.de_abbreviate(c)),
        _ => ent.schema.target_class_iri(ns),
    }
}

/// `S p O`, or `O p S` for a reverse property.
pub(crate) fn property_triple(subject: &Term, pred: &Predicate, object: Term) -> TriplePattern {
    if pred.reverse {
        TriplePattern::new(object, Iri::new(&pred.iri), subject.clone())
    } else {
        TriplePattern::new(subject.clone(), Iri::new(&pred.iri), object)
    }
}

/// The FILTER a condition puts on `var`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn condition_filter(
    ent: &EntConstr,
    subject: &Term,
    pred: &Predicate,
    key: &str,
    var: &Var,
    cond: &Condition,
    alloc: &mut VarAllocator,
    ns: &NamespaceMap,
) -> Option<Expression> {
    let kind = ent.schema.kind_of(key);
    match cond {
        Condition::Value(v) => filter::equality(var, v, kind.element(), ns),
        Condition::Relation { relation, .. } if relation.is_existence() => {
            Some(existence_filter(ent.index, subject, pred, key, *relation, alloc))
        }
        Condition::Relation { relation, values } => {
            filter::relation(var, *relation, values, kind.element(), ns)
        }
        Condition::VarRef(_) | Condition::Bind { .. } => None,
    }
}

/// `FILTER [NOT] EXISTS { S p ?{key}Exist{index} }`
pub(crate) fn existence_filter(
    index: usize,
    subject: &Term,
    pred: &Predicate,
    key: &str,
    relation: Relation,
    alloc: &mut VarAllocator,
) -> Expression {
    let witness = alloc.alloc(&format!("{}Exist{}", key, index));
    let pattern = vec![GraphPattern::triple(property_triple(
        subject,
        pred,
        Term::Var(witness),
    ))];
    if relation == Relation::Exist {
        Expression::Exists(pattern)
    } else {
        Expression::NotExists(pattern)
    }
}

fn bind_term(pos: &str, alloc: &mut VarAllocator, ns: &NamespaceMap) -> Term {
    match pos.strip_prefix('?') {
        Some(name) => Term::Var(alloc.reserve(name)),
        None => Term::iri(ns.de_abbreviate(pos)),
    }
}

fn bind_triple(t: &BindTriple, alloc: &mut VarAllocator, ns: &NamespaceMap) -> TriplePattern {
    let predicate = match t.predicate.strip_prefix('?') {
        Some(name) => PredicateTerm::Var(alloc.reserve(name)),
        None => PredicateTerm::Iri(Iri::new(ns.de_abbreviate(&t.predicate))),
    };
    TriplePattern {
        subject: bind_term(&t.subject, alloc, ns),
        predicate,
        object: bind_term(&t.object, alloc, ns),
    }
}

/// Compile one entity.
pub fn compile_entity(
    ent: &EntConstr,
    ns: &NamespaceMap,
    config: &CompilerConfig,
    alloc: &mut VarAllocator,
    options: CompileOptions,
) -> Result<EntityFragment> {
    let index = ent.index;
    let schema = &ent.schema;
    let subject = subject_term(ent, ns, alloc)?;
    let mut frag = EntityFragment::new(index, subject.clone());
    frag.service = ent.service.as_deref().map(|s| Iri::new(ns.de_abbreviate(s)));

    if let (Some(Condition::Relation { relation, values }), Term::Var(v)) =
        (ent.condition("@id"), &subject)
    {
        frag.filters
            .extend(filter::relation(v, *relation, values, &ValueKind::Iri, ns));
    }

    let class = entity_class(ent, ns);
    if ent.resolve_type {
        let mst = most_specific_type(&subject, class.as_deref(), index, alloc);
        frag.mandatory.push(mst.type_triple);
        frag.filters.extend(mst.filters);
        frag.props.insert("@type", mst.type_var.clone());
        frag.type_var = Some(mst.type_var);
    } else if let Some(class) = &class {
        frag.mandatory.push(exact_type(&subject, class));
    }

    let selected = selected_keys(ent);
    for key in &selected {
        match key.as_str() {
            "@id" => {
                if let Term::Var(v) = &subject {
                    frag.props.insert("@id", v.clone());
                }
                continue;
            }
            "@type" => continue,
            _ => {}
        }
        let cond = ent.condition(key);
        if matches!(cond, Some(Condition::Bind { .. })) {
            continue;
        }
        let Some(prop) = schema.property(key) else {
            // Outside the schema only a shared variable can bind it
            if alloc.is_shared(key) {
                frag.props.insert(key.clone(), alloc.reserve(key));
            } else {
                trace!(entity = index, key = %key, "unknown variable, skipping");
            }
            continue;
        };
        if prop.kind().is_array() && options.defer_arrays {
            frag.arrays.push(key.clone());
            continue;
        }
        let Some(pred) = schema.predicate(key, ns) else {
            trace!(entity = index, key = %key, "no predicate in @context, skipping");
            continue;
        };

        let var = match cond {
            Some(Condition::VarRef(name)) => alloc.reserve(name),
            _ => alloc.alloc_or_join(&format!("{}{}", key, index)),
        };
        let triple = property_triple(&subject, &pred, Term::Var(var.clone()));
        if schema.is_required(key) || cond.map_or(false, Condition::narrows) {
            frag.mandatory.push(triple);
        } else {
            frag.optional.push(triple);
        }
        if let Some(cond) = cond {
            frag.filters
                .extend(condition_filter(ent, &subject, &pred, key, &var, cond, alloc, ns));
        }
        frag.props.insert(key.clone(), var);
    }

    for (key, cond) in &ent.conditions {
        if key == "@id" || key == "@type" || frag.props.contains_key(key) {
            continue;
        }
        if let Condition::Bind { relation, triples } = cond {
            let var = alloc.alloc_or_join(&format!("{}{}", key, index));
            let pattern = vec![GraphPattern::Bgp(
                triples.iter().map(|t| bind_triple(t, alloc, ns)).collect(),
            )];
            let expr = match relation {
                BindRelation::Exists => Expression::Exists(pattern),
                BindRelation::NotExists => Expression::NotExists(pattern),
            };
            frag.binds.push((expr, var.clone()));
            frag.bind_template.push(TriplePattern::new(
                subject.clone(),
                Iri::new(config.local_iri(key)),
                Term::Var(var.clone()),
            ));
            frag.bind_vars.insert(key.clone(), var);
            continue;
        }
        let Some(pred) = schema.predicate(key, ns) else {
            trace!(entity = index, key = %key, "condition without predicate, skipping");
            continue;
        };
        let var = match cond {
            Condition::VarRef(name) => alloc.reserve(name),
            Condition::Relation { relation, .. } if relation.is_existence() => {
                frag.filters
                    .push(existence_filter(index, &subject, &pred, key, *relation, alloc));
                continue;
            }
            _ => alloc.alloc_or_join(&format!("{}{}", key, index)),
        };
        frag.mandatory
            .push(property_triple(&subject, &pred, Term::Var(var.clone())));
        frag.filters
            .extend(condition_filter(ent, &subject, &pred, key, &var, cond, alloc, ns));
        frag.hidden.insert(key.clone(), var);
    }

    trace!(
        entity = index,
        mandatory = frag.mandatory.len(),
        optional = frag.optional.len(),
        filters = frag.filters.len(),
        "compiled entity"
    );
    frag.selected = selected;
    Ok(frag)
}
