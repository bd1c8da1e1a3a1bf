//! SQLite storage for shelf.
//!
//! A [`Database`] owns the connection pool. Modules describe their schema as
//! [`Migration`]s; each one is applied once per database and recorded in a
//! ledger table, so reopening an existing file is a no-op.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use sqlx::{
    query, query_scalar, raw_sql,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

pub mod error;

pub use error::DbError;

/// File created inside the configured data directory
pub const DATABASE_FILE: &str = "shelf.db";

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS shelf_migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    PRIMARY KEY (module, id)
)";
const MIGRATION_APPLIED_SQL: &str =
    "SELECT COUNT(*) FROM shelf_migrations WHERE module = ? AND id = ?";
const RECORD_MIGRATION_SQL: &str = "INSERT INTO shelf_migrations (module, id, applied_at) \
     VALUES (?, ?, CAST(strftime('%s', 'now') AS INTEGER))";

/// Schema change contributed by a module
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Handle to the shelf database; clones share one pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Open `data_dir/shelf.db`, or a private in-memory database when no
    /// directory is configured
    pub async fn connect(data_dir: Option<&Path>, max_connections: u32) -> Result<Self, DbError> {
        match data_dir {
            Some(dir) => Self::open(dir, max_connections).await,
            None => Self::in_memory().await,
        }
    }

    /// A database that lives as long as this handle and its clones
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every in-memory connection is its own database, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::info!(target: "shelf-db", "running with an in-memory database");
        Ok(Self { pool, path: None })
    }

    /// Open (creating if needed) the database file under `data_dir`
    pub async fn open(data_dir: &Path, max_connections: u32) -> Result<Self, DbError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(DATABASE_FILE);

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!(target: "shelf-db", path = %path.display(), "opened database file");
        Ok(Self {
            pool,
            path: Some(path),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply `migration` for `module` unless the ledger already records it.
    /// Returns whether it ran.
    pub async fn apply(&self, module: &str, migration: &Migration) -> Result<bool, DbError> {
        query(CREATE_LEDGER_SQL).execute(&self.pool).await?;

        let mut tx = self.pool.begin().await?;

        let applied: i64 = query_scalar(MIGRATION_APPLIED_SQL)
            .bind(module)
            .bind(migration.id)
            .fetch_one(&mut *tx)
            .await?;
        if applied > 0 {
            return Ok(false);
        }

        raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|source| DbError::Migration {
                module: module.to_string(),
                id: migration.id.to_string(),
                source,
            })?;

        query(RECORD_MIGRATION_SQL)
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "shelf-db", module, migration = migration.id, "applied migration");
        Ok(true)
    }

    /// Wait for checked-out connections and close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
