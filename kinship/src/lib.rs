//! kinship - relation-aware query composition
//!
//! Declare entities once (columns, output names, relations), register them
//! in a [`SchemaCatalog`], then compose SELECT statements by naming related
//! entities instead of writing join predicates by hand:
//!
//! ```
//! use kinship::{select, EntityDescriptor, SchemaCatalog};
//!
//! let mut catalog = SchemaCatalog::new();
//! catalog
//!     .register(
//!         EntityDescriptor::builder("users")
//!             .columns(["id", "name"])
//!             .has_many("posts", "user_id")
//!             .build(),
//!     )?
//!     .register(
//!         EntityDescriptor::builder("posts")
//!             .columns(["id", "user_id", "title"])
//!             .belongs_to("users", "user_id")
//!             .build(),
//!     )?;
//!
//! let query = select(&catalog, "posts")?
//!     .left_join("users", ["author"])?
//!     .paginate()
//!     .limit(20)
//!     .build();
//!
//! assert!(query.to_sql()?.ends_with(
//!     "LEFT JOIN \"users\" AS \"author\" ON \"posts\".\"user_id\" = \"author\".\"id\" LIMIT 21"
//! ));
//! # Ok::<(), kinship::Error>(())
//! ```
//!
//! Statements are rendered and executed by [`kinship_core`].

pub mod catalog;
pub mod composer;
pub mod entity;
pub mod error;
pub mod join;
pub mod pagination;
pub mod planner;
pub mod relation;
pub mod shape;

pub use catalog::SchemaCatalog;
pub use composer::{ComposedQuery, QueryComposer};
pub use entity::{ColumnDef, EntityBuilder, EntityDescriptor};
pub use error::{Error, Result};
pub use join::{
    ColumnSpec, Conditions, JoinArg, JoinCondition, JoinKind, JoinOptions, JoinSpec, JoinTarget,
    NestedJoin,
};
pub use pagination::{CursorSource, Page, Pagination, PaginationWindow};
pub use planner::{PlannedColumn, Scope};
pub use relation::{Relation, RelationKind, RelationRegistry};
pub use shape::{shape_row, shape_rows};

pub use kinship_core::{op, ConnectionPool, QueryBuilder, Row, SortDirection, Value};

/// Start a query selecting every declared column of `entity`
pub fn select<'c>(catalog: &'c SchemaCatalog, entity: &str) -> Result<QueryComposer<'c>> {
    QueryComposer::select(catalog, entity)
}
