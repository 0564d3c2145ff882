//! Embedded SQLite storage.
//!
//! [`Store`] wraps a `SqlitePool` and is the only handle to the database. It is
//! built once at startup, cloned into the router and background tasks, and
//! closed when the server shuts down. Each store function runs a single
//! statement inside a `db.query` span.

mod migrate;
pub mod password;
pub mod sessions;
pub mod todos;
pub mod users;

use anyhow::{bail, Context, Result};
use sqlx::{
    error::ErrorKind,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Connection, SqlitePool,
};
use std::{str::FromStr, time::Duration};
use tracing::{info, info_span, Instrument, Span};

pub use sessions::Session;
pub use todos::{NewTodo, Priority, Status, Todo, TodoChanges};
pub use users::User;

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database behind `dsn` and bring the schema
    /// up to date.
    ///
    /// # Errors
    /// Returns an error if the DSN is invalid, the database cannot be opened, or
    /// the schema cannot be applied.
    pub async fn connect(dsn: &str) -> Result<Self> {
        if !dsn.starts_with("sqlite:") {
            bail!("Unsupported database DSN, expected sqlite: {dsn}");
        }

        let options = SqliteConnectOptions::from_str(dsn)
            .with_context(|| format!("Invalid database DSN: {dsn}"))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database, mostly for tests.
    ///
    /// A single pinned connection keeps the database alive for as long as the
    /// store exists.
    ///
    /// # Errors
    /// Returns an error if the database cannot be created.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory DSN")?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        migrate::run(&pool).await?;
        info!("Database schema is up to date");
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip to the database on a pooled connection.
    ///
    /// # Errors
    /// Returns an error if no connection can be acquired or the ping fails.
    pub async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!("db.acquire", db.system = "sqlite", db.operation = "ACQUIRE");
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("Failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "sqlite", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("Failed to ping database")
    }

    /// Close every pooled connection; later calls fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(db_err.kind(), ErrorKind::UniqueViolation),
        _ => false,
    }
}
