// --- File: crates/bookwise_booking/src/error.rs ---
use axum::http::StatusCode;
use bookwise_common::{BookwiseError, HttpStatusCode};
use bookwise_db::DbError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Requested time slot is no longer available: {0}")]
    SlotNoLongerAvailable(String),

    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Repository error: {0}")]
    Repository(DbError),
}

impl From<DbError> for BookingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SlotNoLongerAvailable(msg) => BookingError::SlotNoLongerAvailable(msg),
            DbError::NotFound(msg) => BookingError::NotFound(msg),
            other => BookingError::Repository(other),
        }
    }
}

impl From<BookingError> for BookwiseError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotNoLongerAvailable(msg) => BookwiseError::ConflictError(msg),
            BookingError::Validation(msg) => BookwiseError::ValidationError(msg),
            BookingError::NotFound(msg) => BookwiseError::NotFoundError(msg),
            e @ BookingError::Timeout { .. } => BookwiseError::TimeoutError(e.to_string()),
            BookingError::Repository(e) => BookwiseError::DatabaseError(e.to_string()),
        }
    }
}

/// Handler error shape: status plus a message safe to show to clients.
impl From<BookingError> for (StatusCode, String) {
    fn from(err: BookingError) -> Self {
        let err = BookwiseError::from(err);
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, err.client_message())
    }
}
