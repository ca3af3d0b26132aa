//! Error types for the link calendar backend.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving calendar requests.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request body failed shape or length validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Well-formed request that breaks a domain rule (e.g. end before start)
    #[error("{0}")]
    InvalidArgument(String),

    /// Not found error
    #[error("{0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidArgument(_) => 400,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::Validation(_) => 422,
            _ => 500,
        }
    }

    /// NotFound for an unknown calendar token.
    pub fn calendar_not_found() -> Self {
        Error::NotFound("Calendar not found".to_string())
    }

    /// NotFound for an event id that is missing or owned by another calendar.
    pub fn event_not_found() -> Self {
        Error::NotFound("Event not found".to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(ref db) if db.is_check_violation() => {
                Error::InvalidArgument("end must be >= start".to_string())
            }
            other => Error::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}
