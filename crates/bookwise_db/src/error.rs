//! Error types for the database client

use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be turned back into a domain type
    #[error("Invalid stored data: {0}")]
    DataError(String),

    /// The requested row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write-time recheck found an overlapping appointment or blackout
    #[error("Slot no longer available: {0}")]
    SlotNoLongerAvailable(String),
}
