//! Repository modules for database access

pub mod booking;
pub mod booking_sql;

pub use booking::{BookingRepository, Provider, ReminderRecord};
pub use booking_sql::SqlBookingRepository;
