// --- File: crates/bookwise_booking/src/routes.rs ---
use crate::handlers::{
    book_slot_handler, get_availability_handler, get_booking_handler, update_status_handler,
};
use crate::service::{BookingService, BookingSettings};
use axum::{
    routing::{get, patch, post},
    Router,
};
use bookwise_config::AppConfig;
use bookwise_db::BookingRepository;
use std::sync::Arc;

/// Creates a router containing all booking routes, to be nested under `/api`.
pub fn routes<R>(config: &AppConfig, repository: Arc<R>) -> Router
where
    R: BookingRepository + Send + Sync + 'static,
{
    let service = Arc::new(BookingService::new(
        repository,
        BookingSettings::from_config(config),
    ));
    router(service)
}

pub fn router<R>(service: Arc<BookingService<R>>) -> Router
where
    R: BookingRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/availability", get(get_availability_handler::<R>))
        .route("/bookings", post(book_slot_handler::<R>))
        .route("/bookings/{id}", get(get_booking_handler::<R>))
        .route("/bookings/{id}/status", patch(update_status_handler::<R>))
        .with_state(service)
}
