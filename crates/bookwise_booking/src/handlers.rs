// --- File: crates/bookwise_booking/src/handlers.rs ---
use crate::models::{
    AvailabilityQuery, AvailabilityResponse, BookingRequest, BookingResponse, StatusUpdateRequest,
    StatusUpdateResponse,
};
use crate::service::BookingService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use bookwise_calendar::Appointment;
use bookwise_db::BookingRepository;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::BookingError;

fn reject(context: &str, err: BookingError) -> (StatusCode, String) {
    match &err {
        BookingError::Repository(_) | BookingError::Timeout { .. } => {
            error!("{}: {}", context, err)
        }
        _ => info!("{}: {}", context, err),
    }
    err.into()
}

/// Handler to list bookable start times.
pub async fn get_availability_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, (StatusCode, String)>
where
    R: BookingRepository + Send + Sync + 'static,
{
    let slots = service
        .availability(
            query.provider_id,
            query.date,
            query.duration_minutes,
            query.step_minutes,
        )
        .await
        .map_err(|e| reject("Availability query failed", e))?;

    Ok(Json(AvailabilityResponse {
        provider_id: query.provider_id,
        date: query.date,
        slots,
    }))
}

/// Handler to book a slot.
pub async fn book_slot_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), (StatusCode, String)>
where
    R: BookingRepository + Send + Sync + 'static,
{
    let id = service
        .book(payload)
        .await
        .map_err(|e| reject("Booking rejected", e))?;
    Ok((StatusCode::CREATED, Json(BookingResponse { id })))
}

pub async fn get_booking_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>, (StatusCode, String)>
where
    R: BookingRepository + Send + Sync + 'static,
{
    service
        .get_appointment(id)
        .await
        .map(Json)
        .map_err(|e| reject("Booking lookup failed", e))
}

/// Handler to change the status of a booking (confirm, cancel, ...).
pub async fn update_status_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, (StatusCode, String)>
where
    R: BookingRepository + Send + Sync + 'static,
{
    service
        .update_status(id, payload.status)
        .await
        .map_err(|e| reject("Status update failed", e))?;
    Ok(Json(StatusUpdateResponse {
        id,
        status: payload.status,
    }))
}
