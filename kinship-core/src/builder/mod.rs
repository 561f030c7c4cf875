//! Statement builder module

pub mod common;
pub mod join;
pub mod select;

// Re-export types from submodules
pub use common::{
    quote_ident, ColumnSelector, Expr, IntoColumnSelectors, IntoCondition, JoinType,
    OrderByClause, QueryBuilder, SortDirection, TableRef, WhereCondition, WhereConnector,
};
pub use join::{JoinClause, JoinConnector, OnBuilder, OnCondition, OnOperand, OnPredicate};
pub use select::{FromSource, SelectStatement};
