//! Store errors.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// Store error variants.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `find_one` matched nothing.
    #[error("document not found")]
    NotFound,

    /// The caller's context was cancelled before or during the call.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the call completed.
    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    /// A document with the same `_id` is already stored.
    #[error("document already exists")]
    AlreadyExists,

    /// A document was missing its string `_id`.
    #[error("document has no string _id")]
    MissingId,

    /// A document could not be converted to or from its typed form.
    #[error("document could not be decoded: {0}")]
    Decode(String),

    /// JSON (de)serialisation failed.
    #[error("document serialisation error")]
    Json(#[from] serde_json::Error),

    /// Underlying SQL/storage error.
    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

/// Store result alias.
pub type StoreResult<T> = Result<T, StoreError>;
