//! Core error types for Questboard.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the quest coordination domain.
///
/// Every rejected operation resolves to exactly one of these variants and
/// its `Display` output is the single human-readable message handed back to
/// the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input, raised before any store call.
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A read of an id that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The requested transition is not allowed from the current document state.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Opaque store/transport failure. Always surfaced, never retried.
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Returns true when the error came from the store rather than the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// Returns true for the "index not ready" failure that ordered queries
    /// may degrade from.
    pub fn is_missing_index(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::MissingIndex(_)))
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// An ordered query needs an index that does not exist yet.
    #[error("Query requires missing index: {0}")]
    MissingIndex(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

/// Rejects blank values for a required field.
pub(crate) fn require_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            name.to_string(),
        )));
    }
    Ok(())
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_rejects_whitespace() {
        let err = require_field("title", "   ").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(ref f)) if f == "title"
        ));
        assert!(require_field("title", "Hike").is_ok());
    }

    #[test]
    fn test_missing_index_is_transport() {
        let err = Error::Database(DatabaseError::MissingIndex("quests".to_string()));
        assert!(err.is_missing_index());
        assert!(err.is_transport());
        assert!(!Error::NotFound("q1".to_string()).is_transport());
    }
}
