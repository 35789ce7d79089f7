// --- File: crates/bookwise_booking/src/doc.rs ---

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::models::{
    AvailabilityQuery, AvailabilityResponse, BookingRequest, BookingResponse, StatusUpdateRequest,
    StatusUpdateResponse,
};

#[utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Bookable start times", body = AvailabilityResponse,
         example = json!({
             "provider_id": 1,
             "date": "2025-05-05",
             "slots": ["09:00", "09:30", "10:00"]
         })
        ),
        (status = 400, description = "Invalid duration or step", body = String),
        (status = 500, description = "Internal error", body = String),
        (status = 504, description = "Repository timed out", body = String)
    ),
    tag = "booking"
)]
fn doc_get_availability_handler() {}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body(content = BookingRequest, example = json!({
        "provider_id": 1,
        "date": "2025-05-05",
        "start": "09:30",
        "duration_minutes": 30,
        "customer_name": "Max Muster",
        "customer_phone": "079 123 45 67",
        "service_name": "Haircut"
    })),
    responses(
        (status = 201, description = "Appointment booked", body = BookingResponse,
         example = json!({ "id": 42 })
        ),
        (status = 400, description = "Invalid request or outside opening hours", body = String),
        (status = 409, description = "Slot no longer available", body = String,
         example = json!("Requested time slot is no longer available: overlaps appointment 41")
        ),
        (status = 500, description = "Booking failed", body = String)
    ),
    tag = "booking"
)]
fn doc_book_slot_handler() {}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment"),
        (status = 404, description = "Appointment not found", body = String)
    ),
    tag = "booking"
)]
fn doc_get_booking_handler() {}

#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    params(("id" = i64, Path, description = "Appointment id")),
    request_body(content = StatusUpdateRequest, example = json!({ "status": "canceled" })),
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 404, description = "Appointment not found", body = String)
    ),
    tag = "booking"
)]
fn doc_update_status_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_availability_handler,
        doc_book_slot_handler,
        doc_get_booking_handler,
        doc_update_status_handler
    ),
    components(
        schemas(
            AvailabilityResponse,
            BookingRequest,
            BookingResponse,
            StatusUpdateRequest,
            StatusUpdateResponse
        )
    ),
    tags(
        (name = "booking", description = "Availability and booking API")
    ),
    servers(
        (url = "/api", description = "Bookwise API server")
    )
)]
pub struct BookingApiDoc;
