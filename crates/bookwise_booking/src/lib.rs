// --- File: crates/bookwise_booking/src/lib.rs ---
pub mod doc;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;

pub use error::BookingError;
pub use service::{BookingService, BookingSettings};
