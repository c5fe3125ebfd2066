//! # Database Settings
//!
//! Loads connection parameters from an external TOML file layered with
//! environment variables.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  $SHOP_DB_CONFIG or ./database.toml                                     │
//! │       │                                                                 │
//! │       ├── readable?  ──► file values + SHOP_DB__* overrides             │
//! │       │                  (keys the file omits use field defaults)       │
//! │       │                                                                 │
//! │       └── missing / unreadable / malformed                              │
//! │                      ──► warn! and use DbSettings::default()            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example File
//! ```toml
//! url = "sqlite://shop.db?mode=rwc"
//! username = "shop"
//! password = "shop"
//! driver = "sqlite"
//!
//! [pool]
//! maximum_pool_size = 10
//! minimum_idle = 2
//! connection_timeout_ms = 30000
//! idle_timeout_ms = 600000
//! max_lifetime_ms = 1800000
//!
//! [cache]
//! prepared_statements = true
//! prepared_statement_cache_size = 250
//! ```
//!
//! Values are not validated here. A bad URL surfaces when the pool connects.

use std::borrow::Cow;
use std::env;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "SHOP_DB_CONFIG";

/// Settings file used when `SHOP_DB_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "database.toml";

/// Prefix for per-key environment overrides (`SHOP_DB__POOL__MINIMUM_IDLE=4`).
pub const ENV_PREFIX: &str = "SHOP_DB";

// =============================================================================
// Settings
// =============================================================================

/// Connection and pool settings.
///
/// `Debug` output masks the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    /// Store URL (`sqlite://path?mode=rwc`, `sqlite::memory:`).
    pub url: String,

    /// Account name. SQLite has no authentication, so this is only carried
    /// for parity with server-backed deployments.
    pub username: String,

    /// Account password. Same caveat as `username`.
    pub password: String,

    /// Driver identifier. Only `sqlite` is built in.
    pub driver: String,

    pub pool: PoolSettings,

    pub cache: CacheSettings,
}

/// Pool sizing and timeouts. A timeout of 0 disables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub maximum_pool_size: u32,
    pub minimum_idle: u32,
    pub connection_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub max_lifetime_ms: u64,
}

/// Prepared statement caching per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub prepared_statements: bool,
    pub prepared_statement_cache_size: usize,
}

impl Default for DbSettings {
    fn default() -> Self {
        DbSettings {
            url: "sqlite://shop.db?mode=rwc".to_string(),
            username: "shop".to_string(),
            password: "shop".to_string(),
            driver: "sqlite".to_string(),
            pool: PoolSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            maximum_pool_size: 10,
            minimum_idle: 2,
            connection_timeout_ms: 30_000,
            idle_timeout_ms: 600_000,
            max_lifetime_ms: 1_800_000,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            prepared_statements: true,
            prepared_statement_cache_size: 250,
        }
    }
}

impl DbSettings {
    /// Loads settings from `$SHOP_DB_CONFIG`, or `database.toml` in the
    /// working directory. Never fails: falls back to defaults.
    pub fn load() -> Self {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Loads settings from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                info!(path = %path.display(), "Database settings loaded");
                settings
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Database settings unavailable, using defaults"
                );
                DbSettings::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Isolated in-memory database (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(&DbSettings::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool
    /// holds exactly one connection and never recycles it.
    pub fn in_memory() -> Self {
        DbSettings {
            url: "sqlite::memory:".to_string(),
            pool: PoolSettings {
                maximum_pool_size: 1,
                minimum_idle: 1,
                connection_timeout_ms: 5_000,
                idle_timeout_ms: 0,
                max_lifetime_ms: 0,
            },
            ..DbSettings::default()
        }
    }

    /// URL with any `password=` fragment masked, safe for logs.
    pub fn masked_url(&self) -> Cow<'_, str> {
        mask_password(&self.url)
    }
}

impl fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSettings")
            .field("url", &self.masked_url())
            .field("username", &self.username)
            .field("password", &"***")
            .field("driver", &self.driver)
            .field("pool", &self.pool)
            .field("cache", &self.cache)
            .finish()
    }
}

impl PoolSettings {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.idle_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        non_zero_millis(self.max_lifetime_ms)
    }
}

impl CacheSettings {
    /// Statement cache capacity handed to each connection (0 = disabled).
    pub fn capacity(&self) -> usize {
        if self.prepared_statements {
            self.prepared_statement_cache_size
        } else {
            0
        }
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// =============================================================================
// Masking
// =============================================================================

/// Replaces every `password=...` fragment (up to the next `&` or end of
/// string) with `password=***`.
///
/// ## Example
/// ```rust
/// use shop_db::config::mask_password;
///
/// assert_eq!(
///     mask_password("postgres://db/shop?user=app&password=hunter2&ssl=true"),
///     "postgres://db/shop?user=app&password=***&ssl=true"
/// );
/// ```
pub fn mask_password(url: &str) -> Cow<'_, str> {
    static PASSWORD: OnceLock<Regex> = OnceLock::new();
    let re = PASSWORD.get_or_init(|| {
        Regex::new("password=[^&]*").expect("password mask pattern is valid")
    });
    re.replace_all(url, "password=***")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = DbSettings::default();

        assert_eq!(settings.driver, "sqlite");
        assert_eq!(settings.pool.maximum_pool_size, 10);
        assert_eq!(settings.pool.minimum_idle, 2);
        assert_eq!(settings.pool.connection_timeout(), Duration::from_secs(30));
        assert_eq!(settings.pool.idle_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(settings.pool.max_lifetime(), Some(Duration::from_secs(1800)));
        assert_eq!(settings.cache.capacity(), 250);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DbSettings::load_from(&dir.path().join("nope.toml"));

        assert_eq!(settings, DbSettings::default());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "this is [not toml").unwrap();

        let settings = DbSettings::load_from(file.path());
        assert_eq!(settings, DbSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
url = "sqlite://catalog.db?mode=rwc"

[pool]
maximum_pool_size = 4

[cache]
prepared_statements = false
"#
        )
        .unwrap();

        let settings = DbSettings::load_from(file.path());

        assert_eq!(settings.url, "sqlite://catalog.db?mode=rwc");
        assert_eq!(settings.pool.maximum_pool_size, 4);
        assert_eq!(settings.pool.minimum_idle, 2);
        assert_eq!(settings.username, "shop");
        assert_eq!(settings.cache.capacity(), 0);
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://h/db?password=secret"),
            "postgres://h/db?password=***"
        );
        assert_eq!(
            mask_password("x?password=a&user=b&password=c"),
            "x?password=***&user=b&password=***"
        );
        assert_eq!(mask_password("sqlite::memory:"), "sqlite::memory:");
    }

    #[test]
    fn test_debug_hides_password() {
        let settings = DbSettings {
            url: "sqlite://x.db?password=topsecret".to_string(),
            password: "topsecret".to_string(),
            ..DbSettings::default()
        };

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("password=***"));
    }

    #[test]
    fn test_in_memory_disables_recycling() {
        let settings = DbSettings::in_memory();
        assert_eq!(settings.pool.maximum_pool_size, 1);
        assert_eq!(settings.pool.idle_timeout(), None);
        assert_eq!(settings.pool.max_lifetime(), None);
    }
}
