//! Connection pool factory for the MySQL and SQLite backends.
//!
//! [`Database`] is the single shared resource of the service. It is created
//! once at startup, cloned into whatever needs it (the pools are reference
//! counted) and closed explicitly on shutdown.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use biblioteca_kernel::settings::{DatabaseBackend, DatabaseSettings};

const SQLITE_MEMORY: &str = ":memory:";

/// Handle over the backend-specific connection pool.
#[derive(Debug, Clone)]
pub enum Database {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

impl Database {
    /// Open a pool according to `settings`.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let acquire_timeout = Duration::from_millis(settings.acquire_timeout_ms);

        match settings.backend {
            DatabaseBackend::Mysql => {
                tracing::info!(
                    target: "biblioteca-db",
                    host = %settings.host,
                    port = settings.port,
                    database = %settings.name,
                    "configuring MySQL pool"
                );

                let options = MySqlConnectOptions::new()
                    .host(&settings.host)
                    .port(settings.port)
                    .username(&settings.user)
                    .password(&settings.password)
                    .database(&settings.name);

                // Connections open on first use, so a server that is down at
                // boot fails individual requests instead of the whole process.
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect_lazy_with(options);

                Ok(Database::MySql(pool))
            }
            DatabaseBackend::Sqlite => {
                tracing::info!(
                    target: "biblioteca-db",
                    path = %settings.sqlite_path,
                    "opening SQLite database"
                );

                let in_memory = settings.sqlite_path == SQLITE_MEMORY;
                let options = if in_memory {
                    SqliteConnectOptions::from_str("sqlite::memory:")?
                } else {
                    SqliteConnectOptions::new()
                        .filename(&settings.sqlite_path)
                        .create_if_missing(true)
                };

                // Every in-memory connection is a distinct database, so the
                // pool must hold exactly one connection for its whole life.
                let pool_options = if in_memory {
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None)
                } else {
                    SqlitePoolOptions::new().max_connections(settings.max_connections)
                };

                let pool = pool_options
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .with_context(|| {
                        format!("failed to open SQLite database '{}'", settings.sqlite_path)
                    })?;

                Ok(Database::Sqlite(pool))
            }
        }
    }

    pub fn backend(&self) -> DatabaseBackend {
        match self {
            Database::MySql(_) => DatabaseBackend::Mysql,
            Database::Sqlite(_) => DatabaseBackend::Sqlite,
        }
    }

    /// Close every pooled connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        match self {
            Database::MySql(pool) => pool.close().await,
            Database::Sqlite(pool) => pool.close().await,
        }
        tracing::info!(target: "biblioteca-db", backend = ?self.backend(), "database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Database::MySql(pool) => pool.is_closed(),
            Database::Sqlite(pool) => pool.is_closed(),
        }
    }
}
