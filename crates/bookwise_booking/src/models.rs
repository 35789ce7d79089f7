// --- File: crates/bookwise_booking/src/models.rs ---
use bookwise_calendar::{AppointmentStatus, DateKey, TimeOfDay};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Query of `GET /availability`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AvailabilityQuery {
    pub provider_id: i64,
    /// Local date, `YYYY-MM-DD`.
    #[cfg_attr(feature = "openapi", param(value_type = String, format = Date, example = "2025-05-05"))]
    pub date: DateKey,
    pub duration_minutes: u16,
    /// Slot grid; the configured default when absent.
    pub step_minutes: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailabilityResponse {
    pub provider_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-05-05"))]
    pub date: DateKey,
    /// Start times as `HH:MM`, ascending.
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>, example = json!(["09:00", "09:30"])))]
    pub slots: Vec<TimeOfDay>,
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingRequest {
    pub provider_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-05-05"))]
    pub date: DateKey,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:30"))]
    pub start: TimeOfDay,
    pub duration_minutes: u16,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_name: String,
    /// `pending` unless stated otherwise.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "confirmed"))]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingResponse {
    pub id: i64,
}

/// Body of `PATCH /bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StatusUpdateRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "canceled"))]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StatusUpdateResponse {
    pub id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub status: AppointmentStatus,
}
