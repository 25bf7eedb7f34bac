//! SPARQL expression types.
//!
//! Expressions appear in FILTER and BIND patterns. EXISTS / NOT EXISTS carry
//! a nested group of graph patterns.

use super::pattern::GraphPattern;
use super::term::{Iri, Literal, Var};

/// A SPARQL expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A variable reference
    Var(Var),

    /// A literal value
    Literal(Literal),

    /// An IRI
    Iri(Iri),

    /// Binary operation (comparison, boolean)
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation (logical NOT)
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// Built-in function call
    FunctionCall {
        name: FunctionName,
        args: Vec<Expression>,
    },

    /// EXISTS { pattern }
    Exists(Vec<GraphPattern>),

    /// NOT EXISTS { pattern }
    NotExists(Vec<GraphPattern>),
}

impl Expression {
    pub fn var(var: impl AsRef<str>) -> Self {
        Expression::Var(Var::new(var))
    }

    pub fn literal(lit: Literal) -> Self {
        Expression::Literal(lit)
    }

    pub fn iri(iri: impl AsRef<str>) -> Self {
        Expression::Iri(Iri::new(iri))
    }

    /// Create a binary expression.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Ne, left, right)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }

    /// Logical negation.
    pub fn not(operand: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression.
    pub fn call(name: FunctionName, args: Vec<Expression>) -> Self {
        Expression::FunctionCall { name, args }
    }

    /// Fold a list of expressions with a boolean operator.
    ///
    /// Returns `None` for an empty list; a single expression is returned as-is.
    pub fn fold(op: BinaryOp, exprs: impl IntoIterator<Item = Expression>) -> Option<Self> {
        exprs
            .into_iter()
            .reduce(|acc, next| Expression::binary(op, acc, next))
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    // Logical
    And, // &&
    Or,  // ||

    // Comparison
    Eq, // =
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl BinaryOp {
    /// Get the operator symbol as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// Get the precedence level (higher binds tighter).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT (!)
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }
}

/// Built-in function names the compiler emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionName {
    Bound,
    Str,
    Lcase,
    Contains,
    StrStarts,
    StrEnds,
    Regex,
}

impl FunctionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::Bound => "BOUND",
            FunctionName::Str => "STR",
            FunctionName::Lcase => "LCASE",
            FunctionName::Contains => "CONTAINS",
            FunctionName::StrStarts => "STRSTARTS",
            FunctionName::StrEnds => "STRENDS",
            FunctionName::Regex => "REGEX",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_empty_is_none() {
        assert!(Expression::fold(BinaryOp::Or, Vec::new()).is_none());
    }

    #[test]
    fn test_fold_single_is_identity() {
        let e = Expression::var("x");
        assert_eq!(Expression::fold(BinaryOp::Or, vec![e.clone()]), Some(e));
    }

    #[test]
    fn test_fold_is_left_associative() {
        let folded = Expression::fold(
            BinaryOp::And,
            vec![
                Expression::var("a"),
                Expression::var("b"),
                Expression::var("c"),
            ],
        )
        .unwrap();
        match folded {
            Expression::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::And);
                assert_eq!(*right, Expression::var("c"));
                assert!(matches!(*left, Expression::Binary { .. }));
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
    }
}
