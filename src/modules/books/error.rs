use serde_json::json;
use shelf_db::DbError;
use shelf_http::AppError;
use thiserror::Error;

use super::validation::FieldErrors;

pub use shelf_model::{CONFLICT_MESSAGE, NOT_FOUND_MESSAGE};

#[derive(Debug, Error)]
pub enum BooksError {
    #[error("invalid book payload ({} field errors)", .0.len())]
    Validation(FieldErrors),

    #[error("book with isbn '{isbn}' already exists")]
    Conflict { isbn: String },

    #[error("book not found")]
    NotFound,

    #[error("storage error")]
    Storage(#[source] DbError),
}

impl BooksError {
    /// Map a failed write of the record keyed by `isbn`; the unique index
    /// reports a taken isbn as a conflict
    pub fn from_write(error: DbError, isbn: &str) -> Self {
        if error.is_unique_violation() {
            return Self::Conflict {
                isbn: isbn.to_string(),
            };
        }
        Self::Storage(error)
    }
}

impl From<DbError> for BooksError {
    fn from(error: DbError) -> Self {
        Self::Storage(error)
    }
}

impl From<BooksError> for AppError {
    fn from(error: BooksError) -> Self {
        match error {
            BooksError::Validation(errors) => {
                let message = errors
                    .first()
                    .map(|first| first.message.clone())
                    .unwrap_or_else(|| "Invalid book".to_string());
                let details = errors
                    .into_vec()
                    .into_iter()
                    .map(|e| json!({ "field": e.field, "message": e.message }))
                    .collect();

                AppError::validation(details, message)
            }
            BooksError::Conflict { .. } => AppError::conflict(
                vec![json!({ "field": "isbn", "message": CONFLICT_MESSAGE })],
                CONFLICT_MESSAGE,
            ),
            BooksError::NotFound => AppError::not_found(NOT_FOUND_MESSAGE),
            BooksError::Storage(source) => {
                AppError::Internal(anyhow::Error::new(source).context("book storage failed"))
            }
        }
    }
}
