//! SELECT statement builder

use super::common::{
    quote_ident, ColumnSelector, IntoColumnSelectors, IntoCondition, JoinType, OrderByClause,
    QueryBuilder, SortDirection, TableRef, WhereCondition, WhereConnector,
};
use super::join::{JoinClause, OnBuilder};
use crate::{Result, Value};

/// Where a SELECT reads its rows from
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    Table(TableRef),
    /// A derived table: `(SELECT ...) AS "alias"`
    Subquery {
        statement: Box<SelectStatement>,
        alias: String,
    },
}

impl FromSource {
    fn to_sql(&self) -> Result<String> {
        match self {
            FromSource::Table(table) => Ok(table.to_sql()),
            FromSource::Subquery { statement, alias } => {
                Ok(format!("({}) AS {}", statement.to_sql()?, quote_ident(alias)))
            }
        }
    }

    fn parameters(&self) -> Vec<Value> {
        match self {
            FromSource::Table(_) => Vec::new(),
            FromSource::Subquery { statement, .. } => statement.parameters(),
        }
    }
}

/// A SELECT statement under construction.
///
/// Unlike a plain column setter, `select` appends to the SELECT list, so
/// several callers can contribute columns to one statement. An empty list
/// renders as `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub from: FromSource,
    pub selected_columns: Vec<ColumnSelector>,
    pub join_clauses: Vec<JoinClause>,
    pub where_conditions: Vec<WhereCondition>,
    pub order_by_clauses: Vec<OrderByClause>,
    pub limit_value: Option<u64>,
    pub offset_value: Option<u64>,
}

impl SelectStatement {
    /// Create a statement reading from `table`
    pub fn new(table: impl Into<TableRef>) -> Self {
        Self {
            from: FromSource::Table(table.into()),
            selected_columns: Vec::new(),
            join_clauses: Vec::new(),
            where_conditions: Vec::new(),
            order_by_clauses: Vec::new(),
            limit_value: None,
            offset_value: None,
        }
    }

    /// Append columns to the SELECT list
    ///
    /// # Examples
    /// ```
    /// use kinship_core::{from, QueryBuilder};
    ///
    /// let query = from("users").select(vec!["id", "name"]);
    /// assert_eq!(query.to_sql().unwrap(), "SELECT id, name FROM \"users\"");
    /// ```
    pub fn select<T>(mut self, columns: T) -> Self
    where
        T: IntoColumnSelectors,
    {
        self.selected_columns.extend(columns.into_column_selectors());
        self
    }

    /// Replace the FROM clause with a derived table
    pub fn from_subquery(mut self, subquery: SelectStatement, alias: &str) -> Self {
        self.from = FromSource::Subquery {
            statement: Box::new(subquery),
            alias: alias.to_string(),
        };
        self
    }

    /// Add a JOIN whose ON clause is built by `on`
    pub fn join<F>(mut self, join_type: JoinType, table: TableRef, on: F) -> Self
    where
        F: FnOnce(OnBuilder) -> OnBuilder,
    {
        self.join_clauses
            .push(JoinClause::new(join_type, table, on(OnBuilder::new())));
        self
    }

    /// Add an INNER JOIN clause
    pub fn inner_join<F>(self, table: TableRef, on: F) -> Self
    where
        F: FnOnce(OnBuilder) -> OnBuilder,
    {
        self.join(JoinType::Inner, table, on)
    }

    /// Add a LEFT JOIN clause
    pub fn left_join<F>(self, table: TableRef, on: F) -> Self
    where
        F: FnOnce(OnBuilder) -> OnBuilder,
    {
        self.join(JoinType::Left, table, on)
    }

    /// Add a WHERE condition
    pub fn where_<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.push_where(condition, WhereConnector::And)
    }

    /// Add an OR WHERE condition
    pub fn or_where<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.push_where(condition, WhereConnector::Or)
    }

    /// Add an AND WHERE condition (same as where_)
    pub fn and_where<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.where_(condition)
    }

    fn push_where<C>(mut self, condition: C, connector: WhereConnector) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector,
        });
        self
    }

    /// Add an ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order_by_clauses.push(OrderByClause {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Add an ORDER BY ASC clause (convenience method)
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    /// Add an ORDER BY DESC clause (convenience method)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Set the LIMIT clause
    pub fn limit(mut self, count: u64) -> Self {
        self.limit_value = Some(count);
        self
    }

    /// Set the OFFSET clause
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_value = Some(offset);
        self
    }

    /// The LIMIT currently set, if any
    pub fn limit_value(&self) -> Option<u64> {
        self.limit_value
    }
}

impl QueryBuilder for SelectStatement {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::from("SELECT ");

        if self.selected_columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self
                .selected_columns
                .iter()
                .map(ColumnSelector::to_sql)
                .collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.from.to_sql()?);

        for join in &self.join_clauses {
            sql.push(' ');
            sql.push_str(&join.to_sql()?);
        }

        if !self.where_conditions.is_empty() {
            sql.push_str(" WHERE ");
            for (i, condition) in self.where_conditions.iter().enumerate() {
                if i > 0 {
                    sql.push(' ');
                    sql.push_str(&condition.connector.to_string());
                    sql.push(' ');
                }
                sql.push_str(&condition.to_sql()?);
            }
        }

        if !self.order_by_clauses.is_empty() {
            let order_parts: Vec<String> = self
                .order_by_clauses
                .iter()
                .map(|clause| format!("{} {}", clause.column, clause.direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_parts.join(", "));
        }

        if let Some(limit) = self.limit_value {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(sql)
    }

    fn parameters(&self) -> Vec<Value> {
        let mut params = self.from.parameters();
        for join in &self.join_clauses {
            params.extend(join.parameters());
        }
        for condition in &self.where_conditions {
            params.extend(condition.parameters());
        }
        params
    }
}
