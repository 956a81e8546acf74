//! Shared database types for the version manager
//!
//! This module owns the store handle every repository is built from and the
//! schema bootstrap.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Schema for the three lifecycle tables.
///
/// `domains.images` and `image_domain.domains` hold JSON arrays. The partial
/// unique index backs the one-active-version-per-environment rule; write paths
/// still deactivate before activating.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    name    TEXT    NOT NULL,
    version TEXT    NOT NULL,
    domain  TEXT    NOT NULL,
    tested  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (name, version)
);

CREATE INDEX IF NOT EXISTS idx_images_domain ON images (domain);

CREATE TABLE IF NOT EXISTS domains (
    name     TEXT    NOT NULL,
    version  TEXT    NOT NULL,
    deployed TEXT    NOT NULL DEFAULT 'dev' CHECK (deployed IN ('dev', 'staging', 'prod')),
    tested   INTEGER NOT NULL DEFAULT 0,
    active   INTEGER NOT NULL DEFAULT 0,
    images   TEXT    NOT NULL DEFAULT '[]',
    PRIMARY KEY (name, version)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_domains_one_active
    ON domains (name, deployed) WHERE active = 1;

CREATE TABLE IF NOT EXISTS image_domain (
    image   TEXT NOT NULL PRIMARY KEY,
    domain  TEXT NOT NULL,
    domains TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_image_domain_domain ON image_domain (domain);
"#;

/// How long a writer waits for the store's write lock before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Explicitly constructed handle to the relational store.
///
/// Cloning is cheap; clones share the underlying pool.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to a file-backed store and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        if let Some(parent) = opts.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(BUSY_TIMEOUT * 3)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(url = %database_url, "Store connected");
        Ok(store)
    }

    /// Open a private in-memory store.
    ///
    /// Uses a single connection that never idles out, so the database lives
    /// exactly as long as the pool. Every call yields an independent store.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check store connectivity.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Begin a new unit of work.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so concurrent
    /// units of work queue on the busy timeout instead of failing when a
    /// read-then-write transaction tries to upgrade its lock. Dropping the
    /// transaction without calling `commit` rolls it back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
