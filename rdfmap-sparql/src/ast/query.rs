//! Query forms: SELECT and CONSTRUCT.

use super::expr::Expression;
use super::pattern::{GraphPattern, TriplePattern};
use super::term::Var;

/// A compiled query.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    Select(SelectQuery),
    Construct(ConstructQuery),
}

/// A SELECT query.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    /// Modifier (DISTINCT or none)
    pub modifier: Option<SelectModifier>,
    /// Variables to select (* for all, or specific list)
    pub variables: SelectVariables,
    /// WHERE clause patterns
    pub where_clause: Vec<GraphPattern>,
    /// Solution modifiers
    pub modifiers: SolutionModifiers,
}

impl SelectQuery {
    /// Create a new SELECT query. An empty variable list selects `*`.
    pub fn new(variables: Vec<Var>, where_clause: Vec<GraphPattern>) -> Self {
        let variables = if variables.is_empty() {
            SelectVariables::Star
        } else {
            SelectVariables::Explicit(variables)
        };
        Self {
            modifier: None,
            variables,
            where_clause,
            modifiers: SolutionModifiers::default(),
        }
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.modifier = distinct.then_some(SelectModifier::Distinct);
        self
    }

    pub fn with_modifiers(mut self, modifiers: SolutionModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Projected variables, or `None` for `SELECT *`.
    pub fn projection(&self) -> Option<&[Var]> {
        match &self.variables {
            SelectVariables::Star => None,
            SelectVariables::Explicit(vars) => Some(vars),
        }
    }
}

/// SELECT modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectModifier {
    Distinct,
}

/// Variables selected by a SELECT clause.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectVariables {
    /// SELECT *
    Star,
    /// SELECT ?a ?b ...
    Explicit(Vec<Var>),
}

/// ORDER BY, LIMIT and OFFSET.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolutionModifiers {
    pub order_by: Vec<OrderCondition>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SolutionModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderCondition>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_by.is_empty() && self.limit.is_none() && self.offset.is_none()
    }
}

/// One ORDER BY key.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderCondition {
    pub expr: Expression,
    pub direction: OrderDirection,
}

impl OrderCondition {
    pub fn asc(var: Var) -> Self {
        Self {
            expr: Expression::Var(var),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(var: Var) -> Self {
        Self {
            expr: Expression::Var(var),
            direction: OrderDirection::Desc,
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// A CONSTRUCT query.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructQuery {
    /// Template triples
    pub template: Vec<TriplePattern>,
    /// WHERE clause patterns
    pub where_clause: Vec<GraphPattern>,
    /// Solution modifiers
    pub modifiers: SolutionModifiers,
}

impl ConstructQuery {
    pub fn new(template: Vec<TriplePattern>, where_clause: Vec<GraphPattern>) -> Self {
        Self {
            template,
            where_clause,
            modifiers: SolutionModifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: SolutionModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_star_when_no_variables() {
        let q = SelectQuery::new(vec![], vec![]);
        assert!(matches!(q.variables, SelectVariables::Star));
        assert!(q.projection().is_none());
    }

    #[test]
    fn test_select_variables() {
        let q = SelectQuery::new(vec![Var::new("name"), Var::new("age")], vec![]);
        let vars = q.projection().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name.as_ref(), "name");
        assert_eq!(vars[1].name.as_ref(), "age");
    }

    #[test]
    fn test_distinct_toggle() {
        let q = SelectQuery::new(vec![], vec![]).with_distinct(true);
        assert_eq!(q.modifier, Some(SelectModifier::Distinct));
        let q = q.with_distinct(false);
        assert!(q.modifier.is_none());
    }

    #[test]
    fn test_solution_modifiers_builder() {
        let m = SolutionModifiers::new()
            .with_limit(Some(10))
            .with_offset(Some(5))
            .with_order_by(vec![OrderCondition::desc(Var::new("x"))]);
        assert!(!m.is_empty());
        assert_eq!(m.limit, Some(10));
        assert_eq!(m.order_by[0].direction, OrderDirection::Desc);
        assert!(SolutionModifiers::new().is_empty());
    }
}
