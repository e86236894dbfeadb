//! Error types for the database layer
//!
//! Provides error handling for connection setup, schema migrations and
//! connection-row persistence.

use std::fmt;

/// Result type alias for database operations
pub type OrmResult<T> = Result<T, OrmError>;

/// SQLSTATE raised by PostgreSQL for unique constraint and unique index violations
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error types for database operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrmError {
    /// Database query error
    Database(String),
    /// Connection string or connection establishment error
    Connection(String),
    /// Invalid tooling configuration (platforms, identifiers)
    Configuration(String),
    /// Input validation error
    Validation(String),
    /// Migration step error; the surrounding transaction was rolled back
    Migration(String),
    /// Transaction begin/commit error
    Transaction(String),
    /// Row conflicts with a unique constraint or unique index
    UniqueViolation {
        /// Constraint or index name reported by the server
        constraint: Option<String>,
        message: String,
    },
    /// Record not found
    NotFound(String),
}

impl OrmError {
    /// Check if the error is a unique violation on the named constraint or index
    pub fn is_unique_violation_on(&self, name: &str) -> bool {
        matches!(self, OrmError::UniqueViolation { constraint: Some(c), .. } if c == name)
    }

    /// Check if the error is any unique violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, OrmError::UniqueViolation { .. })
    }
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::Database(msg) => write!(f, "Database error: {}", msg),
            OrmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            OrmError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrmError::Validation(msg) => write!(f, "Validation error: {}", msg),
            OrmError::Migration(msg) => write!(f, "Migration error: {}", msg),
            OrmError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            OrmError::UniqueViolation {
                constraint: Some(name),
                message,
            } => write!(f, "Unique violation on '{}': {}", name, message),
            OrmError::UniqueViolation {
                constraint: None,
                message,
            } => write!(f, "Unique violation: {}", message),
            OrmError::NotFound(what) => write!(f, "Record not found: {}", what),
        }
    }
}

impl std::error::Error for OrmError {}

// Convert from sqlx errors
impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                OrmError::UniqueViolation {
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::RowNotFound => OrmError::NotFound(err.to_string()),
            _ => OrmError::Database(err.to_string()),
        }
    }
}
