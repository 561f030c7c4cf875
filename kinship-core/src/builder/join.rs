//! JOIN clauses and the ON-condition builder

use super::common::{Expr, JoinType, TableRef};
use crate::{Error, IntoOperator, Operator, Result, Value};

/// How ON conditions are connected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinConnector {
    And,
    Or,
}

/// Right-hand side of an ON comparison
#[derive(Debug, Clone, PartialEq)]
pub enum OnOperand {
    /// Another column or expression
    Expr(Expr),
    /// A bound parameter
    Value(Value),
}

/// A single ON predicate
#[derive(Debug, Clone, PartialEq)]
pub enum OnPredicate {
    Compare {
        left: Expr,
        operator: Operator,
        right: OnOperand,
    },
    /// A parenthesised group of conditions
    Group(Vec<OnCondition>),
}

/// A condition in a JOIN ON clause
#[derive(Debug, Clone, PartialEq)]
pub struct OnCondition {
    pub connector: JoinConnector,
    pub predicate: OnPredicate,
}

/// Accumulates the ON conditions of one join.
///
/// The first condition's connector is ignored when rendering, so `on` and
/// `or_on` may both start a clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnBuilder {
    conditions: Vec<OnCondition>,
}

impl OnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, connector: JoinConnector, predicate: OnPredicate) -> Self {
        self.conditions.push(OnCondition {
            connector,
            predicate,
        });
        self
    }

    /// `left op right` between two expressions, AND-connected
    pub fn on<O: IntoOperator>(self, left: Expr, operator: O, right: Expr) -> Self {
        self.push(
            JoinConnector::And,
            OnPredicate::Compare {
                left,
                operator: operator.into_operator(),
                right: OnOperand::Expr(right),
            },
        )
    }

    /// Same as `on`
    pub fn and_on<O: IntoOperator>(self, left: Expr, operator: O, right: Expr) -> Self {
        self.on(left, operator, right)
    }

    /// `left op right`, OR-connected
    pub fn or_on<O: IntoOperator>(self, left: Expr, operator: O, right: Expr) -> Self {
        self.push(
            JoinConnector::Or,
            OnPredicate::Compare {
                left,
                operator: operator.into_operator(),
                right: OnOperand::Expr(right),
            },
        )
    }

    /// `left op ?` with a bound value, AND-connected
    pub fn on_value<O, V>(self, left: Expr, operator: O, value: V) -> Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        self.push(
            JoinConnector::And,
            OnPredicate::Compare {
                left,
                operator: operator.into_operator(),
                right: OnOperand::Value(value.into()),
            },
        )
    }

    /// `left op ?` with a bound value, OR-connected
    pub fn or_on_value<O, V>(self, left: Expr, operator: O, value: V) -> Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        self.push(
            JoinConnector::Or,
            OnPredicate::Compare {
                left,
                operator: operator.into_operator(),
                right: OnOperand::Value(value.into()),
            },
        )
    }

    /// AND a parenthesised group built by `f`. Empty groups are dropped.
    pub fn and_on_group<F>(self, f: F) -> Self
    where
        F: FnOnce(OnBuilder) -> OnBuilder,
    {
        let group = f(OnBuilder::new());
        if group.conditions.is_empty() {
            return self;
        }
        self.push(JoinConnector::And, OnPredicate::Group(group.conditions))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[OnCondition] {
        &self.conditions
    }

    fn into_conditions(self) -> Vec<OnCondition> {
        self.conditions
    }
}

fn render_conditions(conditions: &[OnCondition], sql: &mut String) -> Result<()> {
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            match condition.connector {
                JoinConnector::And => sql.push_str(" AND "),
                JoinConnector::Or => sql.push_str(" OR "),
            }
        }
        match &condition.predicate {
            OnPredicate::Compare {
                left,
                operator,
                right,
            } => {
                operator.validate()?;
                sql.push_str(&left.to_sql());
                sql.push(' ');
                sql.push_str(operator.as_str());
                if operator.is_unary() {
                    continue;
                }
                match right {
                    OnOperand::Expr(expr) => {
                        sql.push(' ');
                        sql.push_str(&expr.to_sql());
                    }
                    OnOperand::Value(_) => sql.push_str(" ?"),
                }
            }
            OnPredicate::Group(inner) => {
                sql.push('(');
                render_conditions(inner, sql)?;
                sql.push(')');
            }
        }
    }
    Ok(())
}

fn collect_parameters(conditions: &[OnCondition], params: &mut Vec<Value>) {
    for condition in conditions {
        match &condition.predicate {
            OnPredicate::Compare {
                operator,
                right: OnOperand::Value(value),
                ..
            } if !operator.is_unary() => params.push(value.clone()),
            OnPredicate::Compare { .. } => {}
            OnPredicate::Group(inner) => collect_parameters(inner, params),
        }
    }
}

/// A complete JOIN clause with table and conditions
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on_conditions: Vec<OnCondition>,
}

impl JoinClause {
    pub fn new(join_type: JoinType, table: TableRef, on: OnBuilder) -> Self {
        Self {
            join_type,
            table,
            on_conditions: on.into_conditions(),
        }
    }

    pub fn to_sql(&self) -> Result<String> {
        let mut sql = format!("{} JOIN {}", self.join_type, self.table.to_sql());

        if self.on_conditions.is_empty() {
            if self.join_type != JoinType::Cross {
                return Err(Error::invalid_query(format!(
                    "{} JOIN on {} has no ON conditions",
                    self.join_type, self.table.name
                )));
            }
            return Ok(sql);
        }

        sql.push_str(" ON ");
        render_conditions(&self.on_conditions, &mut sql)?;
        Ok(sql)
    }

    pub fn parameters(&self) -> Vec<Value> {
        let mut params = Vec::new();
        collect_parameters(&self.on_conditions, &mut params);
        params
    }
}
