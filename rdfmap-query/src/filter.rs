//! Condition → FILTER expression.

use crate::constraint::Relation;
use crate::literal::encode_value;
use crate::schema::ValueKind;
use rdfmap_sparql::ast::{BinaryOp, Expression, FunctionName, Literal, Term, Var};
use rdfmap_vocab::NamespaceMap;
use serde_json::Value as JsonValue;

/// Term as an expression operand.
pub fn term_expr(term: Term) -> Expression {
    match term {
        Term::Var(v) => Expression::Var(v),
        Term::Iri(i) => Expression::Iri(i),
        Term::Literal(l) => Expression::Literal(l),
        Term::BlankNode(label) => Expression::Literal(Literal::string(format!("_:{}", label))),
    }
}

/// `?v = value`, or an `any` chain for an array value.
pub fn equality(var: &Var, value: &JsonValue, kind: &ValueKind, ns: &NamespaceMap) -> Option<Expression> {
    match value {
        JsonValue::Array(values) => relation(var, Relation::Any, values, kind, ns),
        v => Some(Expression::eq(
            Expression::Var(var.clone()),
            term_expr(encode_value(v, kind, ns)),
        )),
    }
}

/// Filter for a `{relation, value}` condition on `var`.
///
/// Existence relations have no expression form here; they need the property
/// pattern and are built by the entity compiler. Returns `None` for them and
/// for empty value lists.
pub fn relation(
    var: &Var,
    relation: Relation,
    values: &[JsonValue],
    kind: &ValueKind,
    ns: &NamespaceMap,
) -> Option<Expression> {
    let v = || Expression::Var(var.clone());
    let lit = |value: &JsonValue| term_expr(encode_value(value, kind, ns));
    let text = |value: &JsonValue| {
        let s = match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        Expression::Literal(Literal::string(s))
    };
    let str_v = || Expression::call(FunctionName::Str, vec![v()]);
    let string_test = |name: FunctionName, value: &JsonValue| {
        Expression::call(name, vec![str_v(), text(value)])
    };

    match relation {
        Relation::Equal | Relation::Any => Expression::fold(
            BinaryOp::Or,
            values.iter().map(|x| Expression::eq(v(), lit(x))),
        ),
        Relation::NotEqual | Relation::NotAny => Expression::fold(
            BinaryOp::And,
            values.iter().map(|x| Expression::ne(v(), lit(x))),
        ),
        Relation::After => values
            .first()
            .map(|x| Expression::binary(BinaryOp::Ge, v(), lit(x))),
        Relation::Before => values
            .first()
            .map(|x| Expression::binary(BinaryOp::Le, v(), lit(x))),
        Relation::Between => match values {
            [from, to, ..] => Some(Expression::and(
                Expression::binary(BinaryOp::Ge, v(), lit(from)),
                Expression::binary(BinaryOp::Lt, v(), lit(to)),
            )),
            _ => None,
        },
        Relation::Contains => Expression::fold(
            BinaryOp::Or,
            values.iter().map(|x| string_test(FunctionName::Contains, x)),
        ),
        Relation::NotContains => Expression::fold(
            BinaryOp::And,
            values
                .iter()
                .map(|x| Expression::not(string_test(FunctionName::Contains, x))),
        ),
        Relation::StartWith => Expression::fold(
            BinaryOp::Or,
            values.iter().map(|x| string_test(FunctionName::StrStarts, x)),
        ),
        Relation::EndWith => Expression::fold(
            BinaryOp::Or,
            values.iter().map(|x| string_test(FunctionName::StrEnds, x)),
        ),
        Relation::RegEx => values.first().map(|pattern| {
            let mut args = vec![str_v(), text(pattern)];
            if let Some(flags) = values.get(1) {
                args.push(text(flags));
            }
            Expression::call(FunctionName::Regex, args)
        }),
        Relation::Exist | Relation::NotExist => None,
    }
}
