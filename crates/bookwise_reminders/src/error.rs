use bookwise_db::DbError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Repository error: {0}")]
    Repository(#[from] DbError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Invalid reminder configuration: {0}")]
    Config(String),
}
