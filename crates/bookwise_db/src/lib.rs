//! Database integration for Bookwise
//!
//! Provides a database agnostic client on top of SQLx and the booking
//! repository used by the availability, booking and reminder flows. SQLite is
//! the default backend; the PostgreSQL driver is enabled through the
//! `postgres` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use bookwise_db::{BookingRepository, DbClient, SqlBookingRepository};
//!
//! async fn setup_db() -> Result<SqlBookingRepository, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite:data/bookwise.db").await?;
//!     let repository = SqlBookingRepository::new(db_client);
//!     repository.init_schema().await?;
//!     Ok(repository)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use repositories::{BookingRepository, Provider, ReminderRecord, SqlBookingRepository};
