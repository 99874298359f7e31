//! Database connection pool.
//!
//! Wraps `sqlx::PgPool` behind an explicitly constructed configuration
//! object. The pool is created once at process start and passed by
//! reference; there are no module-level singletons or first-call-wins
//! globals.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::DbError;

/// Connection pool configuration.
///
/// Deserializable from application config; all tuning knobs have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait when acquiring a connection before failing.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl DbConfig {
    /// Create a config for the given URL with default pool settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// A handle to the PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: PgPool,
}

impl DbPool {
    /// Connect to PostgreSQL using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the pool cannot be established.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let inner = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(DbError::ConnectionFailed)?;

        tracing::info!(
            max_connections = config.max_connections,
            "Database pool established"
        );

        Ok(Self { inner })
    }

    /// Wrap an existing `PgPool` (used by tests that build their own pool).
    #[must_use]
    pub fn from_pool(inner: PgPool) -> Self {
        Self { inner }
    }

    /// Access the underlying `sqlx::PgPool`.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Begin a new database transaction.
    ///
    /// # Errors
    ///
    /// Returns `DbError::QueryFailed` if a connection cannot be acquired.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, DbError> {
        self.inner.begin().await.map_err(DbError::QueryFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DbConfig::new("postgres://localhost/soulkun");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: DbConfig =
            serde_json::from_str(r#"{"url": "postgres://localhost/x"}"#).unwrap();
        assert_eq!(config.url, "postgres://localhost/x");
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_config_deserialize_overrides() {
        let config: DbConfig =
            serde_json::from_str(r#"{"url": "postgres://h/x", "max_connections": 3}"#).unwrap();
        assert_eq!(config.max_connections, 3);
    }
}
