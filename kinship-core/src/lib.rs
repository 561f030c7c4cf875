//! kinship-core - the SQL statement builder underneath kinship
//!
//! This crate renders SELECT statements with quoted identifiers, aliased
//! tables and derived tables, structured JOIN ... ON clauses and bound
//! parameters, and executes them through a [`ConnectionPool`].

pub mod builder;
pub mod error;
pub mod executor;
pub mod operator;
pub mod value;

// Re-export main types
pub use builder::{
    quote_ident, ColumnSelector, Expr, FromSource, IntoColumnSelectors, IntoCondition, JoinClause,
    JoinType, OnBuilder, QueryBuilder, SelectStatement, SortDirection, TableRef,
};
pub use error::{Error, Result};
pub use executor::{ColumnDecoder, ConnectionPool, ExecutableQuery, Row};
pub use operator::{op, IntoOperator, Operator};
pub use value::Value;

/// Create a new SELECT statement reading from the given table
pub fn from(table: &str) -> SelectStatement {
    SelectStatement::new(table)
}

/// Create a raw SQL expression
///
/// # Examples
///
/// ```
/// use kinship_core::raw;
///
/// let expr = raw("lower(\"users\".\"email\")");
/// assert_eq!(expr.to_sql(), "lower(\"users\".\"email\")");
/// ```
pub fn raw(text: &str) -> Expr {
    Expr::raw(text)
}
