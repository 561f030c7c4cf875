//! Common types and traits shared by the statement builders

use crate::{IntoOperator, Operator, Result, Value};

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Generate the SQL query string
    fn to_sql(&self) -> Result<String>;

    /// Get the bound parameters, in the order their placeholders appear
    fn parameters(&self) -> Vec<Value>;
}

/// Quote an identifier with double quotes, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A SQL expression usable in SELECT lists and ON clauses
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference, optionally qualified by a table alias
    Column {
        table: Option<String>,
        column: String,
    },
    /// Raw SQL emitted verbatim
    Raw(String),
}

impl Expr {
    /// A qualified column reference, rendered `"table"."column"`
    pub fn column(table: &str, column: &str) -> Self {
        Self::Column {
            table: Some(table.to_string()),
            column: column.to_string(),
        }
    }

    /// An unqualified column reference
    pub fn bare(column: &str) -> Self {
        Self::Column {
            table: None,
            column: column.to_string(),
        }
    }

    /// Raw SQL text
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    pub fn to_sql(&self) -> String {
        match self {
            Expr::Column { table, column } => {
                let column_sql = if column == "*" {
                    "*".to_string()
                } else {
                    quote_ident(column)
                };
                match table {
                    Some(table) => format!("{}.{}", quote_ident(table), column_sql),
                    None => column_sql,
                }
            }
            Expr::Raw(text) => text.clone(),
        }
    }
}

/// A table reference with an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    /// `"name" AS "alias"`
    pub fn aliased(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", quote_ident(&self.name), quote_ident(alias)),
            None => quote_ident(&self.name),
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::new(name)
    }
}

/// One entry of a SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSelector {
    /// Column text emitted verbatim
    Column(String),
    /// An expression with an optional output alias
    Expr { expr: Expr, alias: Option<String> },
    /// `*` or `"table".*`
    All { table: Option<String> },
}

impl ColumnSelector {
    pub fn column(name: &str) -> Self {
        Self::Column(name.to_string())
    }

    /// `"table".*`
    pub fn all_of(table: &str) -> Self {
        Self::All {
            table: Some(table.to_string()),
        }
    }

    /// An expression rendered `expr AS "alias"`
    pub fn aliased(expr: Expr, alias: &str) -> Self {
        Self::Expr {
            expr,
            alias: Some(alias.to_string()),
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            ColumnSelector::Column(name) => name.clone(),
            ColumnSelector::Expr { expr, alias } => match alias {
                Some(alias) => format!("{} AS {}", expr.to_sql(), quote_ident(alias)),
                None => expr.to_sql(),
            },
            ColumnSelector::All { table } => match table {
                Some(table) => format!("{}.*", quote_ident(table)),
                None => "*".to_string(),
            },
        }
    }
}

/// Trait to convert various types into SELECT list entries
pub trait IntoColumnSelectors {
    fn into_column_selectors(self) -> Vec<ColumnSelector>;
}

impl IntoColumnSelectors for &str {
    fn into_column_selectors(self) -> Vec<ColumnSelector> {
        vec![ColumnSelector::column(self)]
    }
}

impl IntoColumnSelectors for Vec<&str> {
    fn into_column_selectors(self) -> Vec<ColumnSelector> {
        self.into_iter().map(ColumnSelector::column).collect()
    }
}

impl IntoColumnSelectors for ColumnSelector {
    fn into_column_selectors(self) -> Vec<ColumnSelector> {
        vec![self]
    }
}

impl IntoColumnSelectors for Vec<ColumnSelector> {
    fn into_column_selectors(self) -> Vec<ColumnSelector> {
        self
    }
}

/// Trait for conditions that can be used in WHERE clauses
pub trait IntoCondition {
    fn into_condition(self) -> (String, Operator, Value);
}

// Shorthand equality: where_(("age", 18))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), Operator::EQ, self.1.into())
    }
}

// Explicit operators: where_(("age", op::GT, 18)) or where_(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), self.1.into_operator(), self.2.into())
    }
}

// Owned column names, as produced for alias-qualified columns
impl<T, O> IntoCondition for (String, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0, self.1.into_operator(), self.2.into())
    }
}

/// A WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub connector: WhereConnector,
}

impl WhereCondition {
    /// Render `column op ?`, expanding arrays to `(?, ?, ...)` and omitting
    /// the operand of unary operators.
    pub fn to_sql(&self) -> Result<String> {
        self.operator.validate()?;
        let mut sql = format!("{} {}", self.column, self.operator);
        if self.operator.is_unary() {
            return Ok(sql);
        }
        match &self.value {
            Value::Array(items) => {
                let placeholders = vec!["?"; items.len()].join(", ");
                sql.push_str(&format!(" ({})", placeholders));
            }
            _ => sql.push_str(" ?"),
        }
        Ok(sql)
    }

    /// Parameters this condition binds
    pub fn parameters(&self) -> Vec<Value> {
        if self.operator.is_unary() {
            return Vec::new();
        }
        match &self.value {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

/// How WHERE conditions are connected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhereConnector {
    And,
    Or,
}

impl std::fmt::Display for WhereConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WhereConnector::And => write!(f, "AND"),
            WhereConnector::Or => write!(f, "OR"),
        }
    }
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Full => write!(f, "FULL OUTER"),
            JoinType::Cross => write!(f, "CROSS"),
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::op;

    #[test]
    fn test_condition_trait_implementations() {
        let (column, operator, value) = ("name", "John").into_condition();
        assert_eq!(column, "name");
        assert_eq!(operator, op::EQ);
        assert_eq!(value, "John".into());

        let (column, operator, value) = ("age", ">", 18).into_condition();
        assert_eq!(column, "age");
        assert_eq!(operator, op::GT);
        assert_eq!(value, 18.into());
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("posts"), "\"posts\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_expr_rendering() {
        assert_eq!(Expr::column("posts", "title").to_sql(), "\"posts\".\"title\"");
        assert_eq!(Expr::column("users", "*").to_sql(), "\"users\".*");
        assert_eq!(Expr::bare("id").to_sql(), "\"id\"");
        assert_eq!(Expr::raw("COUNT(*)").to_sql(), "COUNT(*)");
    }

    #[test]
    fn test_table_ref_rendering() {
        assert_eq!(TableRef::new("users").to_sql(), "\"users\"");
        assert_eq!(
            TableRef::aliased("users", "author").to_sql(),
            "\"users\" AS \"author\""
        );
    }

    #[test]
    fn test_aliased_selector() {
        let selector = ColumnSelector::aliased(Expr::column("posts", "title"), "posts.title");
        assert_eq!(selector.to_sql(), "\"posts\".\"title\" AS \"posts.title\"");
    }

    #[test]
    fn test_where_condition_array_expansion() {
        let condition = WhereCondition {
            column: "id".to_string(),
            operator: op::IN,
            value: vec![1, 2, 3].into(),
            connector: WhereConnector::And,
        };
        assert_eq!(condition.to_sql().unwrap(), "id IN (?, ?, ?)");
        assert_eq!(condition.parameters().len(), 3);
    }

    #[test]
    fn test_where_condition_unary() {
        let condition = WhereCondition {
            column: "deleted_at".to_string(),
            operator: op::IS_NULL,
            value: Value::Null,
            connector: WhereConnector::And,
        };
        assert_eq!(condition.to_sql().unwrap(), "deleted_at IS NULL");
        assert!(condition.parameters().is_empty());
    }
}
