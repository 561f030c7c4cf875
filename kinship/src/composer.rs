//! Relation-aware composition of SELECT statements.

use kinship_core::{
    op, ColumnSelector, ConnectionPool, ExecutableQuery, Expr, FromSource, IntoCondition,
    IntoOperator, OnBuilder, QueryBuilder, Row, SelectStatement, SortDirection, TableRef, Value,
};
use serde_json::Value as JsonValue;

use crate::catalog::SchemaCatalog;
use crate::entity::EntityDescriptor;
use crate::join::{
    self, ColumnSpec, Conditions, JoinArg, JoinCondition, JoinKind, JoinOptions, JoinSpec,
    JoinTarget,
};
use crate::pagination::{Page, Pagination, PaginationWindow};
use crate::planner::{self, PlannedColumn, Scope};
use crate::relation::RelationKind;
use crate::{Error, Result};

/// Builds one SELECT statement by walking declared relations.
///
/// A composer starts at a root entity ([`QueryComposer::select`]) and adds
/// joins by naming related entities; join predicates and output column
/// names follow from the relations declared in the [`SchemaCatalog`].
/// Nested joins run against a composer scoped to the joined entity, writing
/// into the same statement.
///
/// # Examples
///
/// ```
/// use kinship::{EntityDescriptor, QueryComposer, SchemaCatalog};
///
/// let mut catalog = SchemaCatalog::new();
/// catalog.register(
///     EntityDescriptor::builder("users")
///         .columns(["id", "name"])
///         .has_many("posts", "user_id")
///         .build(),
/// )?;
/// catalog.register(
///     EntityDescriptor::builder("posts")
///         .columns(["id", "user_id", "title"])
///         .build(),
/// )?;
///
/// let sql = QueryComposer::select(&catalog, "users")?
///     .left_join("posts", [vec!["title"]])?
///     .to_sql()?;
///
/// assert_eq!(
///     sql,
///     "SELECT \"users\".\"id\" AS \"id\", \"users\".\"name\" AS \"name\", \
///      \"posts\".\"title\" AS \"posts.title\" FROM \"users\" AS \"users\" \
///      LEFT JOIN \"posts\" AS \"posts\" ON \"posts\".\"user_id\" = \"users\".\"id\""
/// );
/// # Ok::<(), kinship::Error>(())
/// ```
#[derive(Debug)]
pub struct QueryComposer<'c> {
    catalog: &'c SchemaCatalog,
    statement: SelectStatement,
    entity: &'c EntityDescriptor,
    alias: String,
    parent_chain: Option<String>,
    window: PaginationWindow,
    // limit the derived table asked for, before any over-fetch
    subquery_limit: Option<u64>,
}

impl<'c> QueryComposer<'c> {
    /// Select every declared column of `entity`
    pub fn select(catalog: &'c SchemaCatalog, entity: &str) -> Result<Self> {
        Self::select_root(catalog, entity, None, None)
    }

    /// Start a query on `entity AS alias` (the alias defaults to the entity
    /// name), selecting `columns` under their root output names.
    pub fn select_root(
        catalog: &'c SchemaCatalog,
        entity: &str,
        columns: Option<ColumnSpec>,
        alias: Option<&str>,
    ) -> Result<Self> {
        let descriptor = catalog.entity(entity)?;
        let alias = alias.unwrap_or(entity);
        let composer = Self::scoped(catalog, descriptor, alias, None);

        let planned = planner::plan(columns.as_ref(), descriptor, alias, Scope::Root)?;
        Ok(composer.select_planned(planned))
    }

    fn scoped(
        catalog: &'c SchemaCatalog,
        entity: &'c EntityDescriptor,
        alias: &str,
        parent_chain: Option<String>,
    ) -> Self {
        Self {
            catalog,
            statement: SelectStatement::new(TableRef::aliased(entity.name(), alias)),
            entity,
            alias: alias.to_string(),
            parent_chain,
            window: PaginationWindow::unpaginated(),
            subquery_limit: None,
        }
    }

    fn select_planned(mut self, planned: Vec<PlannedColumn>) -> Self {
        if !planned.is_empty() {
            let selectors: Vec<ColumnSelector> = planned
                .into_iter()
                .map(PlannedColumn::into_selector)
                .collect();
            self.statement = self.statement.select(selectors);
        }
        self
    }

    /// The entity this composer is scoped to
    pub fn entity(&self) -> &'c EntityDescriptor {
        self.entity
    }

    /// The alias rows of the current entity are selected under
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn window(&self) -> &PaginationWindow {
        &self.window
    }

    /// Join `target` through its declared relation; `args` are resolved as
    /// described in [`join::resolve`].
    pub fn join<I>(self, kind: JoinKind, target: &str, args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<JoinArg>,
    {
        let spec = join::resolve(kind, target, args)?;
        self.join_spec(spec)
    }

    pub fn inner_join<I>(self, target: &str, args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<JoinArg>,
    {
        self.join(JoinKind::Inner, target, args)
    }

    pub fn left_join<I>(self, target: &str, args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<JoinArg>,
    {
        self.join(JoinKind::Left, target, args)
    }

    /// Join with named options instead of positional arguments
    pub fn join_with(self, kind: JoinKind, target: &str, options: JoinOptions) -> Result<Self> {
        let spec = options.into_spec(kind, target)?;
        self.join_spec(spec)
    }

    /// Materialise a resolved join
    pub fn join_spec(mut self, spec: JoinSpec) -> Result<Self> {
        let source: &'c EntityDescriptor = self.entity;

        let alias = match spec.target() {
            JoinTarget::EveryAlias => {
                let aliases = source.relations().aliases(&spec.target);
                if aliases.is_empty() {
                    return Err(Error::unassociated(source.name(), &spec.target));
                }
                tracing::debug!(
                    entity = %spec.target,
                    aliases = aliases.len(),
                    "kinship.join.expand"
                );
                for alias in aliases {
                    self = self.join_spec(spec.with_alias(alias))?;
                }
                return Ok(self);
            }
            JoinTarget::Alias(alias) => alias.to_string(),
        };

        let relation = source
            .relations()
            .lookup(source.name(), &spec.target, Some(alias.as_str()))?;
        let catalog: &'c SchemaCatalog = self.catalog;
        let target = catalog.entity(&spec.target)?;

        let qualified = match &self.parent_chain {
            Some(chain) => format!("{}.{}", chain, alias),
            None => alias,
        };

        let planned = planner::plan(spec.columns.as_ref(), target, &qualified, Scope::Nested)?;
        self = self.select_planned(planned);

        let (left, right) = match relation.kind {
            RelationKind::BelongsTo => (
                Expr::column(&self.alias, &relation.foreign_key),
                Expr::column(&qualified, target.primary_key()),
            ),
            RelationKind::HasOne | RelationKind::HasMany | RelationKind::BelongsToMany => (
                Expr::column(&qualified, &relation.foreign_key),
                Expr::column(&self.alias, source.primary_key()),
            ),
        };

        tracing::debug!(
            entity = %spec.target,
            alias = %qualified,
            kind = %spec.kind,
            relation = ?relation.kind,
            "kinship.join"
        );

        let conditions = match &spec.condition {
            Some(JoinCondition::Equals(conditions)) => Some(conditions),
            _ => None,
        };
        let on = |on: OnBuilder| {
            let on = on.on(left, op::EQ, right);
            match conditions {
                Some(conditions) => condition_terms(on, &qualified, conditions),
                None => on,
            }
        };
        self.statement =
            self.statement
                .join(spec.kind, TableRef::aliased(&spec.target, &qualified), on);

        if let Some(JoinCondition::Nested(nested)) = &spec.condition {
            let mut scoped = Self::scoped(catalog, target, &qualified, Some(qualified.clone()));
            scoped.statement = self.statement;
            let scoped = nested.call(scoped)?;
            self.statement = scoped.statement;
        }

        Ok(self)
    }

    /// Read from a derived table built by `f` for the same entity and alias.
    ///
    /// When this composer is paginated and the subquery carries a limit `n`,
    /// the subquery fetches `n + 1` rows and that becomes this query's
    /// effective limit. `paginate` may come before or after this call.
    pub fn from_subquery<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(QueryComposer<'c>) -> Result<QueryComposer<'c>>,
    {
        let inner = Self::scoped(
            self.catalog,
            self.entity,
            &self.alias,
            self.parent_chain.clone(),
        );
        let subquery = f(inner)?.statement;
        self.subquery_limit = subquery.limit_value();

        self.statement = self
            .statement
            .select(ColumnSelector::all_of(&self.alias))
            .from_subquery(subquery, &self.alias);
        self.paginate_subquery();
        Ok(self)
    }

    // Over-fetch through the derived table's own limit
    fn paginate_subquery(&mut self) {
        let Some(requested) = self.subquery_limit else {
            return;
        };
        if !self.window.is_paginated() {
            return;
        }
        if let FromSource::Subquery { statement, .. } = &mut self.statement.from {
            let limit = requested.saturating_add(1);
            tracing::debug!(alias = %self.alias, limit, "kinship.paginate.subquery");
            statement.limit_value = Some(limit);
            self.window.set_effective_limit(limit);
        }
    }

    /// Paginate on the `id` column
    pub fn paginate(self) -> Self {
        self.paginate_by("id")
    }

    /// Paginate on `column`; limits set earlier, on this query or on its
    /// derived table, are rewritten to over-fetch
    pub fn paginate_by(mut self, column: &str) -> Self {
        self.window.enable(Pagination::new(column));
        self.paginate_subquery();
        match self.window.requested_limit() {
            Some(limit) => self.limit(limit),
            None => self,
        }
    }

    /// Add a WHERE condition
    pub fn where_<C: IntoCondition>(mut self, condition: C) -> Self {
        self.statement = self.statement.where_(condition);
        self
    }

    pub fn or_where<C: IntoCondition>(mut self, condition: C) -> Self {
        self.statement = self.statement.or_where(condition);
        self
    }

    pub fn and_where<C: IntoCondition>(mut self, condition: C) -> Self {
        self.statement = self.statement.and_where(condition);
        self
    }

    /// WHERE on a column of the current entity, qualified with its alias
    pub fn where_column<O, V>(mut self, column: &str, operator: O, value: V) -> Self
    where
        O: IntoOperator,
        V: Into<Value>,
    {
        let column = Expr::column(&self.alias, column).to_sql();
        self.statement = self.statement.where_((column, operator, value));
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.statement = self.statement.order_by(column, direction);
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Limit the number of rows; paginated queries fetch one extra.
    ///
    /// A paginated limit of 0 always yields an empty page without a cursor.
    pub fn limit(mut self, count: u64) -> Self {
        let sent = self.window.request_limit(count);
        if sent != count {
            tracing::debug!(requested = count, sent, "kinship.paginate.limit");
        }
        self.statement = self.statement.limit(sent);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.statement = self.statement.offset(offset);
        self
    }

    /// Hand the statement and its pagination window off for execution
    pub fn build(self) -> ComposedQuery {
        ComposedQuery {
            statement: self.statement,
            window: self.window,
        }
    }

    pub fn to_sql(&self) -> Result<String> {
        Ok(self.statement.to_sql()?)
    }

    pub fn parameters(&self) -> Vec<Value> {
        self.statement.parameters()
    }
}

// `joined.column = ?` terms, then the `$or` group
fn condition_terms(mut on: OnBuilder, alias: &str, conditions: &Conditions) -> OnBuilder {
    for (column, value) in &conditions.equals {
        on = on.on_value(Expr::column(alias, column), op::EQ, value.clone());
    }
    if conditions.any_of.is_empty() {
        return on;
    }
    on.and_on_group(|mut group| {
        for (i, (column, value)) in conditions.any_of.iter().enumerate() {
            let column = Expr::column(alias, column);
            group = if i == 0 {
                group.on_value(column, op::EQ, value.clone())
            } else {
                group.or_on_value(column, op::EQ, value.clone())
            };
        }
        group
    })
}

/// A finished statement together with its pagination window
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    statement: SelectStatement,
    window: PaginationWindow,
}

impl ComposedQuery {
    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn window(&self) -> &PaginationWindow {
        &self.window
    }

    pub fn into_parts(self) -> (SelectStatement, PaginationWindow) {
        (self.statement, self.window)
    }

    pub fn to_sql(&self) -> Result<String> {
        Ok(self.statement.to_sql()?)
    }

    pub fn parameters(&self) -> Vec<Value> {
        self.statement.parameters()
    }

    /// Trim fetched rows to the page this query asked for
    pub fn paginate(&self, rows: Vec<Row>) -> Page<Row> {
        self.window.apply(rows)
    }

    /// Execute and return one page of flat rows
    pub async fn fetch_page<P: ConnectionPool>(&self, pool: &P) -> Result<Page<Row>> {
        let rows: Vec<Row> = ExecutableQuery::<Row>::fetch_all(&self.statement, pool).await?;
        Ok(self.window.apply(rows))
    }

    /// Execute and return one page of nested rows
    pub async fn fetch_shaped_page<P: ConnectionPool>(&self, pool: &P) -> Result<Page<JsonValue>> {
        Ok(self.fetch_page(pool).await?.shaped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> SchemaCatalog {
        let mut catalog = SchemaCatalog::new();
        catalog
            .register(
                EntityDescriptor::builder("users")
                    .columns(["id", "name"])
                    .has_many("posts", "user_id")
                    .has_many_as("posts", "editor_id", "edited")
                    .build(),
            )
            .unwrap()
            .register(
                EntityDescriptor::builder("posts")
                    .columns(["id", "user_id", "title"])
                    .belongs_to("users", "user_id")
                    .has_many("comments", "post_id")
                    .build(),
            )
            .unwrap()
            .register(
                EntityDescriptor::builder("comments")
                    .columns(["id", "post_id", "body"])
                    .build(),
            )
            .unwrap();
        catalog
    }

    fn bare<'c>(
        catalog: &'c SchemaCatalog,
        entity: &str,
        alias: Option<&str>,
    ) -> QueryComposer<'c> {
        QueryComposer::select_root(catalog, entity, Some(ColumnSpec::List(vec![])), alias)
            .unwrap()
    }

    #[test]
    fn test_root_select() {
        let catalog = catalog();
        let query = QueryComposer::select_root(
            &catalog,
            "users",
            Some(ColumnSpec::List(vec!["name".into()])),
            Some("u"),
        )
        .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"u\".\"name\" AS \"name\" FROM \"users\" AS \"u\""
        );
    }

    #[test]
    fn test_has_many_join() {
        let catalog = catalog();
        let query = QueryComposer::select_root(
            &catalog,
            "users",
            Some(ColumnSpec::List(vec!["name".into()])),
            None,
        )
        .unwrap()
        .left_join("posts", [vec!["title"]])
        .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"users\".\"name\" AS \"name\", \"posts\".\"title\" AS \"posts.title\" \
             FROM \"users\" AS \"users\" \
             LEFT JOIN \"posts\" AS \"posts\" ON \"posts\".\"user_id\" = \"users\".\"id\""
        );
    }

    #[test]
    fn test_belongs_to_join() {
        let catalog = catalog();
        let query = bare(&catalog, "posts", None)
            .inner_join("users", ["author"])
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"author\".\"id\" AS \"author.id\", \"author\".\"name\" AS \"author.name\" \
             FROM \"posts\" AS \"posts\" \
             INNER JOIN \"users\" AS \"author\" ON \"posts\".\"user_id\" = \"author\".\"id\""
        );
    }

    #[test]
    fn test_unassociated_join() {
        let catalog = catalog();
        let err = QueryComposer::select(&catalog, "users")
            .unwrap()
            .left_join("comments", ["comments"])
            .unwrap_err();
        assert_eq!(err.to_string(), "comments is not associated with users");
    }

    #[test]
    fn test_join_conditions() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .left_join(
                "posts",
                [
                    JoinArg::from("p"),
                    JoinArg::from(vec!["id"]),
                    JoinArg::from(json!({"title": "hi", "$or": {"id": 1, "user_id": 2}})),
                ],
            )
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"p\".\"id\" AS \"p.id\" FROM \"users\" AS \"users\" \
             LEFT JOIN \"posts\" AS \"p\" ON \"p\".\"user_id\" = \"users\".\"id\" \
             AND \"p\".\"title\" = ? AND (\"p\".\"id\" = ? OR \"p\".\"user_id\" = ?)"
        );
        assert_eq!(
            query.parameters(),
            vec![Value::from("hi"), Value::I32(1), Value::I32(2)]
        );
    }

    #[test]
    fn test_every_alias() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .left_join("posts", ["*", "id"].map(JoinArg::from))
            .unwrap_err();
        assert!(matches!(query, Error::AmbiguousJoinArguments { position: 1, .. }));

        let query = bare(&catalog, "users", None)
            .join_with(
                JoinKind::Left,
                "posts",
                JoinOptions::new().every_alias().columns(["id"]),
            )
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"posts\".\"id\" AS \"posts.id\", \"edited\".\"id\" AS \"edited.id\" \
             FROM \"users\" AS \"users\" \
             LEFT JOIN \"posts\" AS \"posts\" ON \"posts\".\"user_id\" = \"users\".\"id\" \
             LEFT JOIN \"posts\" AS \"edited\" ON \"edited\".\"editor_id\" = \"users\".\"id\""
        );
    }

    #[test]
    fn test_nested_join() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .join_with(
                JoinKind::Left,
                "posts",
                JoinOptions::new()
                    .columns(["title"])
                    .nested(|posts| posts.left_join("comments", [vec!["body"]])),
            )
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"posts\".\"title\" AS \"posts.title\", \
             \"posts.comments\".\"body\" AS \"posts.comments.body\" \
             FROM \"users\" AS \"users\" \
             LEFT JOIN \"posts\" AS \"posts\" ON \"posts\".\"user_id\" = \"users\".\"id\" \
             LEFT JOIN \"comments\" AS \"posts.comments\" \
             ON \"posts.comments\".\"post_id\" = \"posts\".\"id\""
        );
    }

    #[test]
    fn test_nested_error_propagates() {
        let catalog = catalog();
        let err = QueryComposer::select(&catalog, "users")
            .unwrap()
            .left_join(
                "posts",
                [JoinArg::nested(|posts| posts.left_join("tags", ["tags"]))],
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "tags is not associated with posts");
    }

    #[test]
    fn test_where_column_and_passthroughs() {
        let catalog = catalog();
        let query = bare(&catalog, "users", Some("u"))
            .where_column("name", op::LIKE, "j%")
            .or_where(("\"u\".\"id\"", 3))
            .order_by_desc("\"u\".\"id\"")
            .offset(10);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT * FROM \"users\" AS \"u\" WHERE \"u\".\"name\" LIKE ? OR \"u\".\"id\" = ? \
             ORDER BY \"u\".\"id\" DESC OFFSET 10"
        );
    }

    #[test]
    fn test_paginated_limit() {
        let catalog = catalog();
        let query = QueryComposer::select(&catalog, "users")
            .unwrap()
            .paginate()
            .limit(3);
        assert_eq!(query.statement().limit_value(), Some(4));
        assert_eq!(query.window().requested_limit(), Some(3));

        let query = QueryComposer::select(&catalog, "users")
            .unwrap()
            .limit(3)
            .paginate_by("name");
        assert_eq!(query.statement().limit_value(), Some(4));
        assert_eq!(query.window().effective_limit(), Some(4));
    }

    #[test]
    fn test_subquery_pagination() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .paginate()
            .from_subquery(|inner| Ok(inner.where_column("name", op::EQ, "jack").limit(2)))
            .unwrap();
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT \"users\".* FROM (SELECT * FROM \"users\" AS \"users\" \
             WHERE \"users\".\"name\" = ? LIMIT 3) AS \"users\""
        );
        assert_eq!(query.window().effective_limit(), Some(3));
    }

    #[test]
    fn test_subquery_without_pagination() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .from_subquery(|inner| Ok(inner.limit(2)))
            .unwrap();
        assert!(query.to_sql().unwrap().contains("LIMIT 2) AS \"users\""));
        assert_eq!(query.window().effective_limit(), None);
    }

    #[test]
    fn test_paginate_after_subquery() {
        let catalog = catalog();
        let query = bare(&catalog, "users", None)
            .from_subquery(|inner| Ok(inner.limit(2)))
            .unwrap()
            .paginate();
        assert!(query.to_sql().unwrap().contains("LIMIT 3) AS \"users\""));
        assert_eq!(query.window().effective_limit(), Some(3));

        // paginating twice does not over-fetch twice
        let query = query.paginate_by("name");
        assert!(query.to_sql().unwrap().contains("LIMIT 3) AS \"users\""));
        assert_eq!(query.window().effective_limit(), Some(3));
    }

    #[test]
    fn test_build_and_paginate_rows() {
        let catalog = catalog();
        let composed = QueryComposer::select(&catalog, "users")
            .unwrap()
            .paginate()
            .limit(1)
            .build();
        let rows: Vec<Row> = vec![
            json!({"id": 1}).as_object().cloned().unwrap(),
            json!({"id": 2}).as_object().cloned().unwrap(),
        ];
        let page = composed.paginate(rows);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.next_cursor, Some(json!(1)));
    }
}
