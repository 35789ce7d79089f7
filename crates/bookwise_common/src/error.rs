// --- File: crates/bookwise_common/src/error.rs ---
use thiserror::Error;

/// The error type every Bookwise HTTP surface answers with.
///
/// Crate-specific errors convert into this type at the HTTP boundary so that
/// every handler maps failures to status codes the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookwiseError {
    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The requested slot or resource was taken concurrently
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BookwiseError {
    fn status_code(&self) -> u16 {
        match self {
            BookwiseError::ValidationError(_) => 400,
            BookwiseError::DatabaseError(_) => 500,
            BookwiseError::ConflictError(_) => 409,
            BookwiseError::NotFoundError(_) => 404,
            BookwiseError::TimeoutError(_) => 504,
        }
    }
}

impl BookwiseError {
    /// Message safe to return to a client; database details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            BookwiseError::DatabaseError(_) => "Internal database error".to_string(),
            other => other.to_string(),
        }
    }
}
