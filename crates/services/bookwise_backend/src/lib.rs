// --- File: crates/services/bookwise_backend/src/lib.rs ---
pub mod app;
pub mod reminders;

use bookwise_db::DbError;
use bookwise_reminders::ReminderError;
use bookwise_twilio::TwilioError;
use thiserror::Error;

/// Everything that can stop the backend from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] bookwise_config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Reminder setup error: {0}")]
    Reminders(#[from] ReminderError),

    #[error("Twilio setup error: {0}")]
    Twilio(#[from] TwilioError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
