//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                                                                 │
//! │       ├── ConnectionFailed / PoolExhausted   store unreachable          │
//! │       ├── Statement { kind, sql, source }    query/update/insert failed │
//! │       ├── InsertFailed(..)                   no row / no generated key  │
//! │       ├── TransactionFailed                  begin/commit failed        │
//! │       └── MigrationFailed                    schema setup failed        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller branches on the variant (demo driver logs and stops)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried. Every failure reaches the caller exactly once.

use std::fmt;

use thiserror::Error;

/// Which execution pattern raised a statement error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Update,
    Insert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Query => "query",
            StatementKind::Update => "update",
            StatementKind::Insert => "insert",
        };
        f.write_str(name)
    }
}

/// Why an insert produced no usable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertFailure {
    /// The statement ran but changed nothing (e.g. `INSERT OR IGNORE` hit a duplicate).
    #[error("no rows were affected")]
    NoRowsAffected,

    /// A row was written but the store reported no generated id.
    #[error("no generated key was returned")]
    MissingGeneratedKey,
}

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be opened or created
    /// - Pool was shut down
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No connection became available within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A query, update or insert was rejected by the store.
    ///
    /// The message stays generic. `sql` is kept for logs and diagnostics
    /// and should not be shown to end users.
    #[error("Database {kind} failed")]
    Statement {
        kind: StatementKind,
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    /// Insert ran without producing a new identity.
    #[error("Insert failed: {0}")]
    InsertFailed(InsertFailure),

    /// Raw store error raised inside a transaction's unit of work.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction could not be started or committed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl DbError {
    /// Wraps a failure from one of the executor's statement patterns.
    ///
    /// Pool-level failures surfaced through a statement are still reported
    /// as connection problems.
    pub fn statement(kind: StatementKind, sql: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => DbError::connection(err),
            source => DbError::Statement {
                kind,
                sql: sql.to_string(),
                source,
            },
        }
    }

    /// Maps a failure to obtain a connection.
    pub fn connection(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::ConnectionFailed(other.to_string()),
        }
    }

    /// True for failures where the store could not be reached at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_) | DbError::PoolExhausted)
    }

    /// SQL text of a failed statement, if any.
    pub fn failing_sql(&self) -> Option<&str> {
        match self {
            DbError::Statement { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// Used by `?` inside transaction units of work, where no statement
/// context is available.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// sqlx::Error::Database       → DbError::QueryFailed(message)
/// Other                       → DbError::QueryFailed(display)
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => DbError::connection(err),
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_message_hides_sql() {
        let err = DbError::statement(
            StatementKind::Query,
            "SELECT * FROM products",
            sqlx::Error::RowNotFound,
        );

        assert_eq!(err.to_string(), "Database query failed");
        assert_eq!(err.failing_sql(), Some("SELECT * FROM products"));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_pool_errors_become_connection_errors() {
        let err = DbError::statement(StatementKind::Update, "UPDATE x", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::PoolExhausted));
        assert!(err.is_connection_error());

        let err = DbError::connection(sqlx::Error::PoolClosed);
        assert!(matches!(err, DbError::ConnectionFailed(_)));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_insert_failure_messages() {
        assert_eq!(
            DbError::InsertFailed(InsertFailure::NoRowsAffected).to_string(),
            "Insert failed: no rows were affected"
        );
        assert_eq!(
            DbError::InsertFailed(InsertFailure::MissingGeneratedKey).to_string(),
            "Insert failed: no generated key was returned"
        );
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::QueryFailed(_)));

        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(err.is_connection_error());
    }
}
