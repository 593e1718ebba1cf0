use thiserror::Error;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("constraint violation: {reason}")]
    ConstraintViolation { reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Check if a rusqlite error is a UNIQUE constraint violation.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation)
}
