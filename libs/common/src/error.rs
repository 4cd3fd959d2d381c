//! Custom error types for the common library
//!
//! This module defines the database error type shared by every repository in
//! the workspace.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {}", constraint.as_deref().unwrap_or("unknown"))]
    Conflict { constraint: Option<String> },

    /// The row the statement expected does not exist
    #[error("Row not found")]
    NotFound,
}

impl DatabaseError {
    /// Whether this is a conflict on the named unique constraint
    pub fn is_conflict_on(&self, name: &str) -> bool {
        matches!(self, DatabaseError::Conflict { constraint: Some(c) } if c == name)
    }

    /// A column held a value the model cannot represent
    pub fn decode(message: impl Into<String>) -> Self {
        DatabaseError::Query(SqlxError::Decode(message.into().into()))
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => DatabaseError::NotFound,
            SqlxError::Database(ref db) if db.is_unique_violation() => DatabaseError::Conflict {
                constraint: db.constraint().map(str::to_string),
            },
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                DatabaseError::Connection(err)
            }
            other => DatabaseError::Query(other),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
