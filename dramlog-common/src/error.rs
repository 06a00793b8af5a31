//! Common error types for dramlog

use thiserror::Error;

/// Common result type for dramlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the dramlog crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of a stored column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write rejected by a uniqueness constraint
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// True when a sqlx error is a unique constraint violation
///
/// SQLite reports these as extended code 2067 (SQLITE_CONSTRAINT_UNIQUE)
/// or 1555 (SQLITE_CONSTRAINT_PRIMARYKEY).
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_unique_violation()
                || matches!(db_error.code().as_deref(), Some("2067") | Some("1555"))
        }
        _ => false,
    }
}

/// True when a sqlx error is a foreign key violation
///
/// SQLite reports these as extended code 787 (SQLITE_CONSTRAINT_FOREIGNKEY).
pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            db_error.is_foreign_key_violation() || db_error.code().as_deref() == Some("787")
        }
        _ => false,
    }
}
