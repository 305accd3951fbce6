use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum PurgeError {
    /// Rejected before any statement runs.
    #[error("Invalid purge configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for PurgeError {
    fn from(err: sqlx::Error) -> Self {
        PurgeError::Db(DbError::Sqlx(err))
    }
}

pub type PurgeResult<T> = Result<T, PurgeError>;
