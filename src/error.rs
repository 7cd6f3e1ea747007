//! Tool-layer errors

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Unknown user: {0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    CatalogUnavailable(String),

    #[error("{0}")]
    ProductNotFound(String),

    #[error("{0}")]
    MissingCalories(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Report generation failed: {0}")]
    Report(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Caller-side problems, as opposed to failures of the service itself
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::NotFound(_)
                | AppError::ProductNotFound(_)
                | AppError::MissingCalories(_)
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(DbError::Sqlite(e))
    }
}
