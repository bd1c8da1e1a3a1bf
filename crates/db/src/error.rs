//! Error types for the database layer

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unique constraint violated: {message}")]
    UniqueViolation { message: String },

    #[error("migration '{module}/{id}' failed")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("could not prepare data directory")]
    Io(#[from] std::io::Error),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl DbError {
    /// Whether a unique index rejected the write
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        let unique = error
            .as_database_error()
            .filter(|db| matches!(db.kind(), ErrorKind::UniqueViolation))
            .map(DatabaseError::message)
            .map(str::to_string);

        match unique {
            Some(message) => Self::UniqueViolation { message },
            None => Self::Sql(error),
        }
    }
}
