use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("No database configured")]
    NotConfigured,

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;
