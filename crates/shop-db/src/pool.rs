//! # Database Pool Management
//!
//! Connection pool creation, liveness checks, statistics and shutdown.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbSettings::load() ← file / env / defaults                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(&settings).await ← Create pool (explicitly owned)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                            │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                            │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (maximum_pool_size)       │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                            │
//! │  └─────────────────────────────────────────┘                            │
//! │       │                                                                 │
//! │       │ every executor call borrows ONE connection                      │
//! │       ▼                                                                 │
//! │  SqlExecutor ──► ProductRepository                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.shutdown().await  ← closes every connection, idempotent             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no global pool. Callers construct a `Database` and hand clones
//! (or references) to whoever needs it. Tests build as many isolated
//! in-memory instances as they like.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, Sqlite, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::config::DbSettings;
use crate::error::{DbError, DbResult};
use crate::executor::SqlExecutor;
use crate::migrations;
use crate::repository::product::ProductRepository;

/// Upper bound for the liveness ping in [`Database::test_connection`].
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Driver identifier this crate is built for.
pub const SQLITE_DRIVER: &str = "sqlite";

// =============================================================================
// Pool Statistics
// =============================================================================

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently checked out.
    pub active: u32,
    /// Connections sitting idle in the pool.
    pub idle: u32,
    /// All open connections (`active + idle`).
    pub total: u32,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "active={}, idle={}, total={}",
            self.active, self.idle, self.total
        )
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle: owns the pool and hands out data-access components.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Parses the store URL into connection options
    /// 2. Applies statement cache sizing
    /// 3. Creates the pool and opens `minimum_idle` connections
    ///
    /// Schema migrations are NOT run here; call [`Database::run_migrations`].
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - Bad URL, unsupported driver or
    ///   unreachable store
    pub async fn new(settings: &DbSettings) -> DbResult<Self> {
        info!(
            url = %settings.masked_url(),
            driver = %settings.driver,
            "Initializing database connection pool"
        );

        if !settings.driver.eq_ignore_ascii_case(SQLITE_DRIVER) {
            return Err(DbError::ConnectionFailed(format!(
                "unsupported driver '{}'",
                settings.driver
            )));
        }

        let connect_options = SqliteConnectOptions::from_str(&settings.url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .statement_cache_capacity(settings.cache.capacity());

        debug!(
            statement_cache = settings.cache.capacity(),
            "Connection options configured"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.pool.maximum_pool_size)
            .min_connections(settings.pool.minimum_idle)
            .acquire_timeout(settings.pool.connection_timeout())
            .idle_timeout(settings.pool.idle_timeout())
            .max_lifetime(settings.pool.max_lifetime())
            .connect_with(connect_options)
            .await
            .map_err(DbError::connection)?;

        info!(
            max_connections = settings.pool.maximum_pool_size,
            min_idle = settings.pool.minimum_idle,
            "Database pool created"
        );

        Ok(Database { pool })
    }

    /// Runs embedded schema migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Borrows one connection from the pool.
    ///
    /// The connection goes back to the pool when the returned guard is
    /// dropped.
    ///
    /// ## Errors
    /// * `ConnectionFailed` - pool is shut down or the store is unreachable
    /// * `PoolExhausted` - nothing freed up within `connection_timeout_ms`
    pub async fn acquire(&self) -> DbResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(DbError::connection)
    }

    /// Checks that a connection can be obtained and answers a ping within
    /// [`LIVENESS_TIMEOUT`].
    ///
    /// Never errors: every failure is logged and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        let mut conn = match self.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "Could not obtain a database connection");
                return false;
            }
        };

        match tokio::time::timeout(LIVENESS_TIMEOUT, conn.ping()).await {
            Ok(Ok(())) => {
                info!("Database connection is healthy");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Database connection is not valid");
                false
            }
            Err(_) => {
                warn!(
                    timeout_secs = LIVENESS_TIMEOUT.as_secs(),
                    "Database liveness check timed out"
                );
                false
            }
        }
    }

    /// Snapshot of pool occupancy. Side-effect free.
    pub fn pool_stats(&self) -> PoolStats {
        let total = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(total);
        PoolStats {
            active: total.saturating_sub(idle),
            idle,
            total,
        }
    }

    /// Logs the current pool occupancy at info level.
    pub fn log_pool_stats(&self) {
        let stats = self.pool_stats();
        info!(
            active = stats.active,
            idle = stats.idle,
            total = stats.total,
            "Connection pool status"
        );
    }

    /// Closes every pooled connection.
    ///
    /// Idempotent: a second call is a no-op. Afterwards every acquire fails
    /// with `ConnectionFailed`.
    pub async fn shutdown(&self) {
        if self.pool.is_closed() {
            debug!("Database pool already closed");
            return;
        }
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Generic data-access executor sharing this pool.
    pub fn executor(&self) -> SqlExecutor {
        SqlExecutor::new(self.clone())
    }

    /// Returns the product repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let tools = db.products().find_by_category("Tools").await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.executor())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
