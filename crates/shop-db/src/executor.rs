//! # Statement Executor
//!
//! Reusable execution patterns that every repository is built from.
//!
//! ## Patterns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One call = one pooled connection                    │
//! │                                                                         │
//! │  query(sql, params, mapper)      → Vec<T>    rows mapped in order       │
//! │  query_optional(sql, params, m)  → Option<T> first mapped row           │
//! │  query_scalar(sql, params)       → i64       first column, first row    │
//! │  update(sql, params)             → u64       affected rows (0 = no hit) │
//! │  insert_returning_key(sql, p)    → i64       store-generated id         │
//! │  in_transaction(work)            → T         commit / rollback          │
//! │                                                                         │
//! │  acquire ──► bind ?1..?n ──► execute ──► map ──► drop(conn)             │
//! │                                              ▲                          │
//! │                     released on every exit ──┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `*_on` functions run the same patterns on a connection the caller
//! already holds, which is how units of work inside
//! [`SqlExecutor::in_transaction`] issue statements.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row, Sqlite};
use tracing::{debug, error};

use crate::error::{DbError, DbResult, InsertFailure, StatementKind};
use crate::pool::Database;

/// Boxed future borrowed from a transaction's connection.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

// =============================================================================
// Parameters
// =============================================================================

/// A positional statement parameter (`?1`, `?2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Builds a `Vec<SqlValue>` from heterogeneous values.
///
/// ```rust
/// use shop_db::params;
/// use shop_db::executor::SqlValue;
///
/// let p = params!["Tools", 5_i64, true];
/// assert_eq!(p[0], SqlValue::Text("Tools".to_string()));
/// ```
#[macro_export]
macro_rules! params {
    () => { Vec::<$crate::executor::SqlValue>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::executor::SqlValue::from($value)),+]
    };
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &'q [SqlValue]) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

fn statement_error(kind: StatementKind, sql: &str, err: sqlx::Error) -> DbError {
    error!(kind = %kind, sql = %sql, error = %err, "Statement failed");
    DbError::statement(kind, sql, err)
}

// =============================================================================
// Patterns on a held connection
// =============================================================================

/// Runs a read query on `conn`, mapping each row in result order.
pub async fn query_on<T, F>(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[SqlValue],
    mut mapper: F,
) -> DbResult<Vec<T>>
where
    F: FnMut(&SqliteRow) -> Result<T, sqlx::Error>,
{
    let rows = bind_all(sqlx::query(sql), params)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| statement_error(StatementKind::Query, sql, e))?;

    let mapped = rows
        .iter()
        .map(&mut mapper)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| statement_error(StatementKind::Query, sql, e))?;

    debug!(rows = mapped.len(), "Query returned rows");
    Ok(mapped)
}

/// Runs a write statement on `conn` and returns the affected row count.
pub async fn update_on(conn: &mut SqliteConnection, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
    let result = bind_all(sqlx::query(sql), params)
        .execute(&mut *conn)
        .await
        .map_err(|e| statement_error(StatementKind::Update, sql, e))?;

    Ok(result.rows_affected())
}

/// Runs an insert on `conn` and returns the generated row id.
///
/// ## Errors
/// * `InsertFailed(NoRowsAffected)` - the statement wrote nothing
/// * `InsertFailed(MissingGeneratedKey)` - a row was written but SQLite
///   reported no rowid (e.g. a `WITHOUT ROWID` table)
pub async fn insert_on(conn: &mut SqliteConnection, sql: &str, params: &[SqlValue]) -> DbResult<i64> {
    let result = bind_all(sqlx::query(sql), params)
        .execute(&mut *conn)
        .await
        .map_err(|e| statement_error(StatementKind::Insert, sql, e))?;

    if result.rows_affected() == 0 {
        error!(sql = %sql, "Insert affected no rows");
        return Err(DbError::InsertFailed(InsertFailure::NoRowsAffected));
    }

    let id = result.last_insert_rowid();
    if id <= 0 {
        error!(sql = %sql, "Insert returned no generated key");
        return Err(DbError::InsertFailed(InsertFailure::MissingGeneratedKey));
    }

    Ok(id)
}

// =============================================================================
// Executor
// =============================================================================

/// Generic data-access base. Each call borrows its own pooled connection.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    db: Database,
}

impl SqlExecutor {
    pub fn new(db: Database) -> Self {
        SqlExecutor { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs a read query and maps every row through `mapper`.
    ///
    /// Returns an empty vec (never an error) when nothing matches.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let names = executor
    ///     .query("SELECT name FROM products WHERE stock > ?1", &params![0_i64], |row| {
    ///         row.try_get::<String, _>("name")
    ///     })
    ///     .await?;
    /// ```
    pub async fn query<T, F>(&self, sql: &str, params: &[SqlValue], mapper: F) -> DbResult<Vec<T>>
    where
        F: FnMut(&SqliteRow) -> Result<T, sqlx::Error>,
    {
        let mut conn = self.db.acquire().await?;
        query_on(&mut *conn, sql, params, mapper).await
    }

    /// Like [`SqlExecutor::query`] but keeps only the first mapped row.
    pub async fn query_optional<T, F>(
        &self,
        sql: &str,
        params: &[SqlValue],
        mapper: F,
    ) -> DbResult<Option<T>>
    where
        F: FnMut(&SqliteRow) -> Result<T, sqlx::Error>,
    {
        Ok(self.query(sql, params, mapper).await?.into_iter().next())
    }

    /// First column of the first row as an integer, 0 when no row.
    pub async fn query_scalar(&self, sql: &str, params: &[SqlValue]) -> DbResult<i64> {
        let value = self
            .query_optional(sql, params, |row| row.try_get::<i64, _>(0))
            .await?;
        Ok(value.unwrap_or(0))
    }

    /// Runs a write statement. 0 means "no matching row", not an error.
    pub async fn update(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let mut conn = self.db.acquire().await?;
        update_on(&mut *conn, sql, params).await
    }

    /// Runs an insert and returns the store-generated identifier.
    pub async fn insert_returning_key(&self, sql: &str, params: &[SqlValue]) -> DbResult<i64> {
        let mut conn = self.db.acquire().await?;
        insert_on(&mut *conn, sql, params).await
    }

    /// Runs `work` inside a transaction on a single connection.
    ///
    /// ## Flow
    /// ```text
    /// acquire ──► BEGIN ──► work(conn)
    ///                          │
    ///             ┌──── Ok ────┴──── Err ────┐
    ///             ▼                          ▼
    ///          COMMIT                     ROLLBACK (failure only logged)
    ///             │                          │
    ///             ▼                          ▼
    ///          Ok(value)                  Err(original error)
    /// ```
    /// The connection returns to the pool on every path.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let moved = executor
    ///     .in_transaction(|conn| {
    ///         Box::pin(async move {
    ///             update_on(conn, "UPDATE products SET stock = stock - 1 WHERE id = ?1", &params![1_i64]).await?;
    ///             update_on(conn, "UPDATE products SET stock = stock + 1 WHERE id = ?1", &params![2_i64]).await
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn in_transaction<T, F>(&self, work: F) -> DbResult<T>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, DbResult<T>>,
    {
        let mut conn = self.db.acquire().await?;
        let mut tx = conn
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                error!(error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbSettings;
    use crate::params;
    use chrono::SubsecRound;

    async fn executor() -> SqlExecutor {
        let db = Database::new(&DbSettings::in_memory()).await.unwrap();
        let executor = db.executor();
        executor
            .update(
                "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL, pinned BOOLEAN NOT NULL, seen_at TEXT)",
                &[],
            )
            .await
            .unwrap();
        executor
    }

    fn body(row: &SqliteRow) -> Result<String, sqlx::Error> {
        row.try_get("body")
    }

    #[tokio::test]
    async fn test_query_preserves_order_and_binds_positionally() {
        let ex = executor().await;
        for text in ["b", "a", "c"] {
            ex.insert_returning_key(
                "INSERT INTO notes (body, pinned) VALUES (?1, ?2)",
                &params![text, true],
            )
            .await
            .unwrap();
        }

        let all = ex
            .query("SELECT body FROM notes ORDER BY body DESC", &[], body)
            .await
            .unwrap();
        assert_eq!(all, vec!["c", "b", "a"]);

        let filtered = ex
            .query(
                "SELECT body FROM notes WHERE body <> ?1 AND pinned = ?2 ORDER BY id",
                &params!["a", true],
                body,
            )
            .await
            .unwrap();
        assert_eq!(filtered, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_query_with_no_rows_is_empty() {
        let ex = executor().await;
        let rows = ex.query("SELECT body FROM notes", &[], body).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(ex.query_scalar("SELECT id FROM notes", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_null_and_timestamp_params() {
        let ex = executor().await;
        let seen = Utc::now().trunc_subsecs(3);
        let none: Option<String> = None;
        let id = ex
            .insert_returning_key(
                "INSERT INTO notes (body, pinned, seen_at) VALUES (?1, ?2, ?3)",
                &params!["x", false, seen],
            )
            .await
            .unwrap();
        ex.insert_returning_key(
            "INSERT INTO notes (body, pinned, seen_at) VALUES (?1, ?2, ?3)",
            &params!["y", false, none],
        )
        .await
        .unwrap();

        let stamps = ex
            .query("SELECT seen_at FROM notes ORDER BY id", &[], |row| {
                row.try_get::<Option<DateTime<Utc>>, _>("seen_at")
            })
            .await
            .unwrap();
        assert_eq!(stamps, vec![Some(seen), None]);
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn test_update_reports_affected_rows() {
        let ex = executor().await;
        ex.insert_returning_key("INSERT INTO notes (body, pinned) VALUES ('a', 0)", &[])
            .await
            .unwrap();

        let hit = ex
            .update("UPDATE notes SET pinned = 1 WHERE id = ?1", &params![1_i64])
            .await
            .unwrap();
        let miss = ex
            .update("UPDATE notes SET pinned = 1 WHERE id = ?1", &params![99_i64])
            .await
            .unwrap();

        assert_eq!(hit, 1);
        assert_eq!(miss, 0);
    }

    #[tokio::test]
    async fn test_insert_without_rows_is_integrity_failure() {
        let ex = executor().await;
        let err = ex
            .insert_returning_key(
                "INSERT INTO notes (body, pinned) SELECT 'never', 0 WHERE 0",
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::InsertFailed(InsertFailure::NoRowsAffected)));
    }

    #[tokio::test]
    async fn test_insert_without_rowid_is_missing_key() {
        let db = Database::new(&DbSettings::in_memory()).await.unwrap();
        let ex = db.executor();
        ex.update("CREATE TABLE tags (name TEXT PRIMARY KEY) WITHOUT ROWID", &[])
            .await
            .unwrap();

        let err = ex
            .insert_returning_key("INSERT INTO tags (name) VALUES (?1)", &params!["new"])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::InsertFailed(InsertFailure::MissingGeneratedKey)));
    }

    #[tokio::test]
    async fn test_bad_sql_is_wrapped_with_statement_text() {
        let ex = executor().await;
        let err = ex
            .query("SELECT nope FROM missing_table", &[], body)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Database query failed");
        assert_eq!(err.failing_sql(), Some("SELECT nope FROM missing_table"));

        // the connection was released despite the failure
        assert!(ex.database().test_connection().await);
    }

    #[tokio::test]
    async fn test_mapper_failure_is_query_error() {
        let ex = executor().await;
        ex.insert_returning_key("INSERT INTO notes (body, pinned) VALUES ('a', 0)", &[])
            .await
            .unwrap();

        let err = ex
            .query("SELECT body FROM notes", &[], |row| row.try_get::<i64, _>("missing"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Statement { kind: StatementKind::Query, .. }
        ));
    }

    #[tokio::test]
    async fn test_transaction_commits_on_success() {
        let ex = executor().await;

        let ids = ex
            .in_transaction(|conn| {
                Box::pin(async move {
                    let a = insert_on(conn, "INSERT INTO notes (body, pinned) VALUES ('a', 0)", &[]).await?;
                    let b = insert_on(conn, "INSERT INTO notes (body, pinned) VALUES ('b', 0)", &[]).await?;
                    Ok::<_, DbError>(vec![a, b])
                })
            })
            .await
            .unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(ex.query_scalar("SELECT COUNT(*) FROM notes", &[]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_and_keeps_original_error() {
        let ex = executor().await;

        let err = ex
            .in_transaction(|conn| {
                Box::pin(async move {
                    insert_on(conn, "INSERT INTO notes (body, pinned) VALUES ('a', 0)", &[]).await?;
                    // body is NOT NULL
                    insert_on(conn, "INSERT INTO notes (body, pinned) VALUES (NULL, 0)", &[]).await
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Statement { kind: StatementKind::Insert, .. }
        ));
        assert_eq!(ex.query_scalar("SELECT COUNT(*) FROM notes", &[]).await.unwrap(), 0);

        // connection is back in the pool and usable outside a transaction
        assert_eq!(
            ex.update("UPDATE notes SET pinned = 1", &[]).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_raw_sqlx_error_in_transaction_is_query_failed() {
        let ex = executor().await;

        let err = ex
            .in_transaction(|conn| {
                Box::pin(async move {
                    insert_on(conn, "INSERT INTO notes (body, pinned) VALUES ('a', 0)", &[]).await?;
                    sqlx::query("INSERT INTO missing_table (x) VALUES (1)")
                        .execute(&mut *conn)
                        .await?;
                    Ok::<_, DbError>(())
                })
            })
            .await
            .unwrap_err();

        match err {
            DbError::QueryFailed(message) => assert!(message.contains("missing_table")),
            other => panic!("expected QueryFailed, got {other:?}"),
        }
        assert_eq!(ex.query_scalar("SELECT COUNT(*) FROM notes", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_operations_after_shutdown_are_connection_errors() {
        let ex = executor().await;
        ex.database().shutdown().await;

        let err = ex.query("SELECT body FROM notes", &[], body).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_params_macro() {
        let missing: Option<i64> = None;
        let p = params![1_i64, "x", false, missing];
        assert_eq!(
            p,
            vec![
                SqlValue::Int(1),
                SqlValue::Text("x".to_string()),
                SqlValue::Bool(false),
                SqlValue::Null,
            ]
        );
        assert!(params![].is_empty());
    }
}
