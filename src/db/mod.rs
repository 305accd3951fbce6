mod error;
pub mod repos;
pub mod sqlite;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::config::DatabaseConfig;

/// Database pool holding the analysis history.
///
/// Repositories are cached at construction time to avoid allocation on each access.
/// Engine operations do not go through repositories: they run on a
/// transaction obtained from [`DbPool::begin`].
pub struct DbPool {
    pool: SqlitePool,
    audits: Arc<dyn AuditRepo>,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: SqlitePool) -> Self {
        let audits = Arc::new(sqlite::SqliteAuditRepo::new(pool.clone()));
        DbPool { pool, audits }
    }

    /// Create a DbPool from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                let db = Self::from_sqlite(pool);
                if cfg.run_migrations {
                    db.run_migrations().await?;
                }
                Ok(db)
            }
        }
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&self.pool)
            .await?;
        tracing::info!("SQLite migrations completed successfully");
        Ok(())
    }

    /// Open the transaction an engine operation runs in.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub fn audits(&self) -> Arc<dyn AuditRepo> {
        self.audits.clone()
    }

    /// Direct access to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
