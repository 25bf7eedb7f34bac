//! SPARQL text serializer.
//!
//! Renders the AST to query text. IRIs are compacted against a
//! [`NamespaceMap`] when the local part is a valid `PN_LOCAL`; every prefix
//! that was actually used gets a `PREFIX` line ahead of the query body.
//!
//! Layout is fixed so generated text is stable across runs: top-level WHERE
//! patterns go one per line (one line per triple for BGPs), nested groups are
//! rendered inline.

use crate::ast::{
    BinaryOp, ConstructQuery, Expression, GraphPattern, Iri, Literal, Modify, OrderDirection,
    PredicateTerm, PropertyPath, Query, SelectModifier, SelectQuery, SelectVariables,
    SolutionModifiers, Term, TriplePattern, UnaryOp, UpdateOperation, UpdateRequest,
};
use rdfmap_vocab::NamespaceMap;
use std::collections::BTreeSet;

const INDENT: &str = "  ";

/// Rendering switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Compact IRIs and emit `PREFIX` lines. When false every IRI is `<full>`.
    pub emit_prefixes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            emit_prefixes: true,
        }
    }
}

impl RenderOptions {
    pub fn with_emit_prefixes(mut self, emit: bool) -> Self {
        self.emit_prefixes = emit;
        self
    }
}

/// Render an AST node to SPARQL text.
pub trait ToSparql {
    /// Render with explicit options.
    fn to_sparql_with(&self, ns: &NamespaceMap, options: RenderOptions) -> String;

    /// Render with default options (prefixed IRIs).
    fn to_sparql(&self, ns: &NamespaceMap) -> String {
        self.to_sparql_with(ns, RenderOptions::default())
    }
}

/// Stateful serializer tracking which prefixes were used.
pub struct Serializer<'a> {
    ns: &'a NamespaceMap,
    options: RenderOptions,
    used_prefixes: BTreeSet<String>,
}

impl<'a> Serializer<'a> {
    pub fn new(ns: &'a NamespaceMap, options: RenderOptions) -> Self {
        Self {
            ns,
            options,
            used_prefixes: BTreeSet::new(),
        }
    }

    /// Prepend `PREFIX` declarations for every prefix used so far.
    pub fn finish(self, body: String) -> String {
        let mut out = String::new();
        for prefix in &self.used_prefixes {
            if let Some(stem) = self.ns.get(prefix) {
                out.push_str(&format!("PREFIX {}: <{}>\n", prefix, stem));
            }
        }
        out.push_str(&body);
        out
    }

    /// Prefixes referenced so far, sorted.
    pub fn used_prefixes(&self) -> impl Iterator<Item = &str> {
        self.used_prefixes.iter().map(String::as_str)
    }

    // =========================================================================
    // Query forms
    // =========================================================================

    pub fn select(&mut self, q: &SelectQuery) -> String {
        let mut out = self.select_head(q);
        out.push_str(" WHERE {\n");
        out.push_str(&self.block(&q.where_clause));
        out.push('}');
        out.push_str(&self.modifiers(&q.modifiers, "\n"));
        out
    }

    pub fn construct(&mut self, q: &ConstructQuery) -> String {
        let mut out = String::from("CONSTRUCT {\n");
        out.push_str(&self.template(&q.template));
        out.push_str("}\nWHERE {\n");
        out.push_str(&self.block(&q.where_clause));
        out.push('}');
        out.push_str(&self.modifiers(&q.modifiers, "\n"));
        out
    }

    pub fn update(&mut self, req: &UpdateRequest) -> String {
        req.operations
            .iter()
            .map(|op| self.operation(op))
            .collect::<Vec<_>>()
            .join(" ;\n")
    }

    fn operation(&mut self, op: &UpdateOperation) -> String {
        match op {
            UpdateOperation::InsertData(triples) => {
                format!("INSERT DATA {{\n{}}}", self.template(triples))
            }
            UpdateOperation::Modify(m) => self.modify(m),
        }
    }

    fn modify(&mut self, m: &Modify) -> String {
        let mut out = String::new();
        if !m.delete.is_empty() {
            out.push_str(&format!("DELETE {{\n{}}}\n", self.template(&m.delete)));
        }
        if !m.insert.is_empty() {
            out.push_str(&format!("INSERT {{\n{}}}\n", self.template(&m.insert)));
        }
        out.push_str(&format!("WHERE {{\n{}}}", self.block(&m.where_clause)));
        out
    }

    fn select_head(&mut self, q: &SelectQuery) -> String {
        let mut out = String::from("SELECT");
        match q.modifier {
            Some(SelectModifier::Distinct) => out.push_str(" DISTINCT"),
            None => {}
        }
        match &q.variables {
            SelectVariables::Star => out.push_str(" *"),
            SelectVariables::Explicit(vars) => {
                for v in vars {
                    out.push(' ');
                    out.push_str(&v.to_string());
                }
            }
        }
        out
    }

    fn modifiers(&mut self, m: &SolutionModifiers, sep: &str) -> String {
        let mut out = String::new();
        if !m.order_by.is_empty() {
            let keys: Vec<String> = m
                .order_by
                .iter()
                .map(|c| {
                    let e = self.expression(&c.expr);
                    match c.direction {
                        OrderDirection::Asc => format!("ASC({})", e),
                        OrderDirection::Desc => format!("DESC({})", e),
                    }
                })
                .collect();
            out.push_str(sep);
            out.push_str("ORDER BY ");
            out.push_str(&keys.join(" "));
        }
        if let Some(limit) = m.limit {
            out.push_str(&format!("{}LIMIT {}", sep, limit));
        }
        if let Some(offset) = m.offset {
            out.push_str(&format!("{}OFFSET {}", sep, offset));
        }
        out
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    /// Triples one per line, indented.
    fn template(&mut self, triples: &[TriplePattern]) -> String {
        let mut out = String::new();
        for t in triples {
            out.push_str(INDENT);
            out.push_str(&self.triple(t));
            out.push('\n');
        }
        out
    }

    /// Top-level WHERE body: one line per pattern, one per triple for BGPs.
    fn block(&mut self, patterns: &[GraphPattern]) -> String {
        let mut out = String::new();
        for p in patterns {
            match p {
                GraphPattern::Bgp(triples) => out.push_str(&self.template(triples)),
                other => {
                    out.push_str(INDENT);
                    out.push_str(&self.pattern_inline(other));
                    out.push('\n');
                }
            }
        }
        out
    }

    fn group_inline(&mut self, patterns: &[GraphPattern]) -> String {
        let parts: Vec<String> = patterns
            .iter()
            .filter(|p| !p.is_empty_bgp())
            .map(|p| self.pattern_inline(p))
            .collect();
        if parts.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", parts.join(" "))
        }
    }

    fn pattern_inline(&mut self, p: &GraphPattern) -> String {
        match p {
            GraphPattern::Bgp(triples) => triples
                .iter()
                .map(|t| self.triple(t))
                .collect::<Vec<_>>()
                .join(" "),
            GraphPattern::Optional(inner) => format!("OPTIONAL {}", self.group_inline(inner)),
            GraphPattern::Filter(expr) => self.filter(expr),
            GraphPattern::Bind { expr, var } => {
                format!("BIND({} AS {})", self.expression(expr), var)
            }
            GraphPattern::Group(inner) => self.group_inline(inner),
            GraphPattern::Service {
                endpoint,
                silent,
                patterns,
            } => {
                let endpoint = self.iri(endpoint);
                let silent = if *silent { "SILENT " } else { "" };
                format!("SERVICE {}{} {}", silent, endpoint, self.group_inline(patterns))
            }
            GraphPattern::Subquery(q) => {
                let mut out = self.select_head(q);
                out.push_str(" WHERE ");
                out.push_str(&self.group_inline(&q.where_clause));
                out.push_str(&self.modifiers(&q.modifiers, " "));
                format!("{{ {} }}", out)
            }
        }
    }

    fn filter(&mut self, expr: &Expression) -> String {
        match expr {
            Expression::Exists(inner) => format!("FILTER EXISTS {}", self.group_inline(inner)),
            Expression::NotExists(inner) => {
                format!("FILTER NOT EXISTS {}", self.group_inline(inner))
            }
            other => format!("FILTER({})", self.expression(other)),
        }
    }

    fn triple(&mut self, t: &TriplePattern) -> String {
        let s = self.term(&t.subject);
        let p = self.predicate(&t.predicate);
        let o = self.term(&t.object);
        format!("{} {} {} .", s, p, o)
    }

    fn predicate(&mut self, p: &PredicateTerm) -> String {
        match p {
            PredicateTerm::Var(v) => v.to_string(),
            PredicateTerm::Iri(i) => self.iri(i),
            PredicateTerm::Path(path) => self.path(path),
        }
    }

    fn path(&mut self, path: &PropertyPath) -> String {
        match path {
            PropertyPath::Iri(i) => self.iri(i),
            PropertyPath::Inverse(inner) => format!("^{}", self.path_primary(inner)),
            PropertyPath::ZeroOrMore(inner) => format!("{}*", self.path_primary(inner)),
        }
    }

    fn path_primary(&mut self, path: &PropertyPath) -> String {
        if path.is_simple() {
            self.path(path)
        } else {
            format!("({})", self.path(path))
        }
    }

    // =========================================================================
    // Terms
    // =========================================================================

    fn term(&mut self, t: &Term) -> String {
        match t {
            Term::Var(v) => v.to_string(),
            Term::Iri(i) => self.iri(i),
            Term::Literal(l) => self.literal(l),
            Term::BlankNode(label) => format!("_:{}", label),
        }
    }

    /// Compact an IRI to `prefix:local` when possible, else `<iri>`.
    pub fn iri(&mut self, iri: &Iri) -> String {
        let ns = self.ns;
        if self.options.emit_prefixes {
            if let Some((prefix, local)) = ns.split(iri.as_str()) {
                if is_pn_local(local) {
                    self.used_prefixes.insert(prefix.to_string());
                    return format!("{}:{}", prefix, local);
                }
            }
        }
        format!("<{}>", iri.as_str())
    }

    fn literal(&mut self, l: &Literal) -> String {
        match l {
            Literal::Simple(v) => format!("\"{}\"", escape_string(v)),
            Literal::LangTagged { value, lang } => {
                format!("\"{}\"@{}", escape_string(value), lang)
            }
            Literal::Typed { value, datatype } => {
                format!("\"{}\"^^{}", escape_string(value), self.iri(datatype))
            }
            Literal::Boolean(b) => b.to_string(),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn expression(&mut self, e: &Expression) -> String {
        match e {
            Expression::Var(v) => v.to_string(),
            Expression::Literal(l) => self.literal(l),
            Expression::Iri(i) => self.iri(i),
            Expression::Binary { op, left, right } => {
                let l = self.operand(left, *op, false);
                let r = self.operand(right, *op, true);
                format!("{} {} {}", l, op.as_str(), r)
            }
            Expression::Unary { op, operand } => {
                let inner = self.expression(operand);
                match (op, operand.as_ref()) {
                    (UnaryOp::Not, Expression::Binary { .. }) => {
                        format!("{}({})", op.as_str(), inner)
                    }
                    (UnaryOp::Not, _) => format!("{}{}", op.as_str(), inner),
                }
            }
            Expression::FunctionCall { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expression(a)).collect();
                format!("{}({})", name.as_str(), args.join(", "))
            }
            Expression::Exists(inner) => format!("EXISTS {}", self.group_inline(inner)),
            Expression::NotExists(inner) => format!("NOT EXISTS {}", self.group_inline(inner)),
        }
    }

    /// Parenthesize a binary operand when it binds looser than its parent.
    fn operand(&mut self, e: &Expression, parent: BinaryOp, right: bool) -> String {
        let s = self.expression(e);
        match e {
            Expression::Binary { op, .. }
                if op.precedence() < parent.precedence()
                    || (right && op.precedence() == parent.precedence()) =>
            {
                format!("({})", s)
            }
            _ => s,
        }
    }
}

/// Check that `local` can follow `prefix:` without escaping.
fn is_pn_local(local: &str) -> bool {
    let valid_char = |c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.';
    !local.is_empty()
        && local.chars().all(valid_char)
        && !local.starts_with(['-', '.'])
        && !local.ends_with('.')
}

/// Escape special characters for SPARQL string literals.
///
/// Handles: `\` → `\\`, `"` → `\"`, newline → `\n`, tab → `\t`, carriage return → `\r`.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

impl ToSparql for SelectQuery {
    fn to_sparql_with(&self, ns: &NamespaceMap, options: RenderOptions) -> String {
        let mut s = Serializer::new(ns, options);
        let body = s.select(self);
        s.finish(body)
    }
}

impl ToSparql for ConstructQuery {
    fn to_sparql_with(&self, ns: &NamespaceMap, options: RenderOptions) -> String {
        let mut s = Serializer::new(ns, options);
        let body = s.construct(self);
        s.finish(body)
    }
}

impl ToSparql for Query {
    fn to_sparql_with(&self, ns: &NamespaceMap, options: RenderOptions) -> String {
        match self {
            Query::Select(q) => q.to_sparql_with(ns, options),
            Query::Construct(q) => q.to_sparql_with(ns, options),
        }
    }
}

impl ToSparql for UpdateRequest {
    fn to_sparql_with(&self, ns: &NamespaceMap, options: RenderOptions) -> String {
        let mut s = Serializer::new(ns, options);
        let body = s.update(self);
        s.finish(body)
    }
}
