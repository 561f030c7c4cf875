//! Query execution and connection pool interface

use crate::{QueryBuilder, Result, SelectStatement, Value};
use serde::de::DeserializeOwned;
use std::future::Future;

/// A result row keyed by output column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Trait for database connection pools
pub trait ConnectionPool: Send + Sync + Clone {
    /// Execute a query that returns multiple rows
    fn fetch_all<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns a single row
    fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send + Unpin;

    /// Execute a query that returns an optional row
    fn fetch_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send + Unpin;
}

/// Extension trait for statements to add execution methods
pub trait ExecutableQuery<T>: QueryBuilder {
    /// Execute the query and return all results
    fn fetch_all<P>(&self, pool: &P) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        P: ConnectionPool,
        T: DeserializeOwned + Send + Unpin;

    /// Execute the query and return the first result
    fn fetch_one<P>(&self, pool: &P) -> impl Future<Output = Result<T>> + Send
    where
        P: ConnectionPool,
        T: DeserializeOwned + Send + Unpin;

    /// Execute the query and return an optional result
    fn fetch_optional<P>(&self, pool: &P) -> impl Future<Output = Result<Option<T>>> + Send
    where
        P: ConnectionPool,
        T: DeserializeOwned + Send + Unpin;
}

fn render(query: &impl QueryBuilder) -> Result<(String, Vec<Value>)> {
    let sql = query.to_sql()?;
    let params = query.parameters();
    tracing::debug!(sql = %sql, params = params.len(), "kinship.query");
    Ok((sql, params))
}

impl<T> ExecutableQuery<T> for SelectStatement
where
    T: DeserializeOwned + Send + Unpin,
{
    async fn fetch_all<P>(&self, pool: &P) -> Result<Vec<T>>
    where
        P: ConnectionPool,
    {
        let (sql, params) = render(self)?;
        pool.fetch_all(&sql, &params).await
    }

    async fn fetch_one<P>(&self, pool: &P) -> Result<T>
    where
        P: ConnectionPool,
    {
        let (sql, params) = render(self)?;
        pool.fetch_one(&sql, &params).await
    }

    async fn fetch_optional<P>(&self, pool: &P) -> Result<Option<T>>
    where
        P: ConnectionPool,
    {
        let (sql, params) = render(self)?;
        pool.fetch_optional(&sql, &params).await
    }
}

/// Rewrite `?` placeholders to PostgreSQL's `$1, $2, ...`.
///
/// Question marks inside double-quoted identifiers or single-quoted string
/// literals are left alone.
pub fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_ident = false;
    let mut in_string = false;
    let mut index = 0;

    for ch in sql.chars() {
        match ch {
            '"' if !in_string => in_ident = !in_ident,
            '\'' if !in_ident => in_string = !in_string,
            '?' if !in_ident && !in_string => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
                continue;
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// How a PostgreSQL column is decoded into JSON, keyed by type name.
///
/// Date, time, UUID and NUMERIC columns need the matching `*-support`
/// feature; without it they fail to decode instead of coming back as null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDecoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Json,
    Text,
    Timestamptz,
    Timestamp,
    Date,
    Time,
    Uuid,
    Numeric,
    /// Anything else is read as text, and errors if the driver refuses
    Other,
}

impl ColumnDecoder {
    pub fn for_type(name: &str) -> Self {
        match name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "JSON" | "JSONB" => Self::Json,
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => Self::Text,
            "TIMESTAMPTZ" => Self::Timestamptz,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "UUID" => Self::Uuid,
            "NUMERIC" => Self::Numeric,
            _ => Self::Other,
        }
    }
}

/// SQLx connection pool wrapper
#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::{Column, PgPool, Row as _, TypeInfo, ValueRef};

    /// PostgreSQL connection pool wrapper
    #[derive(Clone)]
    pub struct PostgresPool {
        inner: PgPool,
    }

    impl PostgresPool {
        /// Create a new PostgreSQL pool from a connection string
        pub async fn new(database_url: &str) -> Result<Self> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self { inner: pool })
        }

        /// Create from an existing PgPool
        pub fn from_pool(pool: PgPool) -> Self {
            Self { inner: pool }
        }
    }

    impl ConnectionPool for PostgresPool {
        async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let sql = number_placeholders(sql);
            let query = bind_values_to_query(sqlx::query(&sql), params);
            let rows = query.fetch_all(&self.inner).await?;

            let mut results = Vec::with_capacity(rows.len());
            for row in rows {
                let item: T = serde_json::from_value(row_to_json_value(&row)?)?;
                results.push(item);
            }
            Ok(results)
        }

        async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let sql = number_placeholders(sql);
            let query = bind_values_to_query(sqlx::query(&sql), params);
            let row = query.fetch_one(&self.inner).await?;
            Ok(serde_json::from_value(row_to_json_value(&row)?)?)
        }

        async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            let sql = number_placeholders(sql);
            let query = bind_values_to_query(sqlx::query(&sql), params);
            match query.fetch_optional(&self.inner).await? {
                Some(row) => Ok(Some(serde_json::from_value(row_to_json_value(&row)?)?)),
                None => Ok(None),
            }
        }
    }

    /// Bind Values to a SQLx query
    fn bind_values_to_query<'q>(
        mut query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        params: &'q [Value],
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i32>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Json(j) => query.bind(j),
                // Arrays only reach here outside IN lists; bind them as JSON
                Value::Array(_) => query.bind(param.to_json()),
            };
        }
        query
    }

    /// Decode a row into a JSON object keyed by column name
    fn row_to_json_value(row: &PgRow) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::new();

        for column in row.columns() {
            let ordinal = column.ordinal();
            let is_null = row.try_get_raw(ordinal)?.is_null();

            let value = if is_null {
                serde_json::Value::Null
            } else {
                let decoder = ColumnDecoder::for_type(column.type_info().name());
                decode_column(row, ordinal, decoder)?
            };

            object.insert(column.name().to_string(), value);
        }

        Ok(serde_json::Value::Object(object))
    }

    #[allow(unreachable_patterns)]
    fn decode_column(
        row: &PgRow,
        ordinal: usize,
        decoder: ColumnDecoder,
    ) -> Result<serde_json::Value> {
        use serde_json::Value as Json;

        let value = match decoder {
            ColumnDecoder::Bool => Json::from(row.try_get::<bool, _>(ordinal)?),
            ColumnDecoder::Int2 => Json::from(row.try_get::<i16, _>(ordinal)?),
            ColumnDecoder::Int4 => Json::from(row.try_get::<i32, _>(ordinal)?),
            ColumnDecoder::Int8 => Json::from(row.try_get::<i64, _>(ordinal)?),
            ColumnDecoder::Float4 => Json::from(f64::from(row.try_get::<f32, _>(ordinal)?)),
            ColumnDecoder::Float8 => Json::from(row.try_get::<f64, _>(ordinal)?),
            ColumnDecoder::Json => row.try_get::<Json, _>(ordinal)?,
            #[cfg(feature = "datetime-support")]
            ColumnDecoder::Timestamptz => serde_json::to_value(
                row.try_get::<chrono::DateTime<chrono::Utc>, _>(ordinal)?,
            )?,
            #[cfg(feature = "datetime-support")]
            ColumnDecoder::Timestamp => {
                serde_json::to_value(row.try_get::<chrono::NaiveDateTime, _>(ordinal)?)?
            }
            #[cfg(feature = "datetime-support")]
            ColumnDecoder::Date => {
                serde_json::to_value(row.try_get::<chrono::NaiveDate, _>(ordinal)?)?
            }
            #[cfg(feature = "datetime-support")]
            ColumnDecoder::Time => {
                serde_json::to_value(row.try_get::<chrono::NaiveTime, _>(ordinal)?)?
            }
            #[cfg(feature = "uuid-support")]
            ColumnDecoder::Uuid => Json::String(row.try_get::<uuid::Uuid, _>(ordinal)?.to_string()),
            #[cfg(feature = "decimal-support")]
            ColumnDecoder::Numeric => {
                Json::String(row.try_get::<rust_decimal::Decimal, _>(ordinal)?.to_string())
            }
            _ => Json::String(row.try_get::<String, _>(ordinal)?),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from, op, Error};
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct User {
        id: i32,
        name: String,
    }

    // Mock connection pool that records what it was asked to run
    #[derive(Clone, Default)]
    struct MockPool {
        should_fail: bool,
        seen: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    }

    impl MockPool {
        fn with_failure() -> Self {
            Self {
                should_fail: true,
                ..Self::default()
            }
        }

        fn record(&self, sql: &str, params: &[Value]) -> Result<()> {
            if self.should_fail {
                return Err(Error::sql_generation("Mock fetch failure"));
            }
            self.seen
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(())
        }
    }

    impl ConnectionPool for MockPool {
        async fn fetch_all<T>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params)?;
            let rows = serde_json::json!([
                {"id": 1, "name": "John"},
                {"id": 2, "name": "Jane"}
            ]);
            Ok(serde_json::from_value(rows)?)
        }

        async fn fetch_one<T>(&self, sql: &str, params: &[Value]) -> Result<T>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params)?;
            Ok(serde_json::from_value(serde_json::json!({"id": 1, "name": "John"}))?)
        }

        async fn fetch_optional<T>(&self, sql: &str, params: &[Value]) -> Result<Option<T>>
        where
            T: DeserializeOwned + Send + Unpin,
        {
            self.record(sql, params)?;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_select_fetch_all() {
        let pool = MockPool::default();
        let query = from("users").where_(("age", op::GT, 18));

        let users: Vec<User> = query.fetch_all(&pool).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "Jane");

        let seen = pool.seen.lock().unwrap();
        assert_eq!(seen[0].0, "SELECT * FROM \"users\" WHERE age > ?");
        assert_eq!(seen[0].1, vec![Value::I32(18)]);
    }

    #[tokio::test]
    async fn test_select_fetch_one_and_optional() {
        let pool = MockPool::default();
        let query = from("users").where_(("id", 1));

        let user: User = query.fetch_one(&pool).await.unwrap();
        assert_eq!(user.id, 1);

        let missing: Option<User> = query.fetch_optional(&pool).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fetch_rows_as_maps() {
        let pool = MockPool::default();
        let rows: Vec<Row> = from("users").fetch_all(&pool).await.unwrap();
        assert_eq!(rows[0]["name"], "John");
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let pool = MockPool::with_failure();
        let result: Result<Vec<User>> = from("users").fetch_all(&pool).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_with_block_on() {
        let pool = MockPool::default();
        let query = from("users").where_(("id", 2));

        let users: Vec<User> = tokio_test::block_on(query.fetch_all(&pool)).unwrap();
        assert_eq!(users[0].id, 1);
        assert_eq!(pool.seen.lock().unwrap()[0].1, vec![Value::I32(2)]);
    }

    #[test]
    fn test_column_decoder_dispatch() {
        assert_eq!(ColumnDecoder::for_type("INT4"), ColumnDecoder::Int4);
        assert_eq!(ColumnDecoder::for_type("JSONB"), ColumnDecoder::Json);
        assert_eq!(ColumnDecoder::for_type("VARCHAR"), ColumnDecoder::Text);
        assert_eq!(ColumnDecoder::for_type("TIMESTAMPTZ"), ColumnDecoder::Timestamptz);
        assert_eq!(ColumnDecoder::for_type("DATE"), ColumnDecoder::Date);
        assert_eq!(ColumnDecoder::for_type("UUID"), ColumnDecoder::Uuid);
        assert_eq!(ColumnDecoder::for_type("NUMERIC"), ColumnDecoder::Numeric);
        assert_eq!(ColumnDecoder::for_type("INTERVAL"), ColumnDecoder::Other);
    }

    #[test]
    fn test_number_placeholders() {
        assert_eq!(
            number_placeholders("SELECT * FROM \"t\" WHERE a = ? AND b IN (?, ?)"),
            "SELECT * FROM \"t\" WHERE a = $1 AND b IN ($2, $3)"
        );
        assert_eq!(
            number_placeholders("SELECT \"why?\" FROM t WHERE c = '?' AND d = ?"),
            "SELECT \"why?\" FROM t WHERE c = '?' AND d = $1"
        );
    }
}
