// --- File: crates/bookwise_booking/src/service.rs ---
//! Availability queries and bookings on top of a [`BookingRepository`].
//!
//! Slots are computed from the repository on every request. A booking is
//! checked against the opening hours here and against blackouts and other
//! appointments by the repository, inside the same transaction as the insert.

use crate::error::BookingError;
use crate::models::BookingRequest;
use bookwise_calendar::{
    compute_slots, Appointment, AppointmentStatus, DateKey, Interval, NewAppointment,
    SlotRequest, TimeOfDay,
};
use bookwise_common::normalize_phone;
use bookwise_config::AppConfig;
use bookwise_db::{BookingRepository, DbError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Limits applied to incoming requests.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub default_step_minutes: u16,
    pub max_service_duration_minutes: u16,
    pub default_country_code: String,
    pub query_timeout: Duration,
}

impl BookingSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_step_minutes: config.availability.default_step_minutes,
            max_service_duration_minutes: config.availability.max_service_duration_minutes,
            default_country_code: config.business.default_country_code.clone(),
            query_timeout: Duration::from_secs(config.availability.query_timeout_secs),
        }
    }
}

pub struct BookingService<R> {
    repository: Arc<R>,
    settings: BookingSettings,
}

impl<R> BookingService<R>
where
    R: BookingRepository + Send + Sync,
{
    pub fn new(repository: Arc<R>, settings: BookingSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, BookingError> {
        let timeout = self.settings.query_timeout;
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| BookingError::Timeout { operation, timeout })?
            .map_err(BookingError::from)
    }

    fn check_duration(&self, duration_minutes: u16) -> Result<(), BookingError> {
        if duration_minutes == 0 {
            return Err(BookingError::Validation(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if duration_minutes > self.settings.max_service_duration_minutes {
            return Err(BookingError::Validation(format!(
                "duration_minutes must not exceed {}",
                self.settings.max_service_duration_minutes
            )));
        }
        Ok(())
    }

    /// Free start times of `provider_id` on `date` for a service of
    /// `duration_minutes`.
    pub async fn availability(
        &self,
        provider_id: i64,
        date: DateKey,
        duration_minutes: u16,
        step_minutes: Option<u16>,
    ) -> Result<Vec<TimeOfDay>, BookingError> {
        self.check_duration(duration_minutes)?;
        let step = step_minutes.unwrap_or(self.settings.default_step_minutes);
        if step == 0 {
            return Err(BookingError::Validation(
                "step_minutes must be positive".to_string(),
            ));
        }

        let schedule = self
            .bounded("schedule lookup", self.repository.get_weekly_schedule(provider_id))
            .await?;
        let blackouts = self
            .bounded("blackout lookup", self.repository.get_blackouts(provider_id, date))
            .await?;
        let appointments = self
            .bounded(
                "appointment lookup",
                self.repository.get_appointments(provider_id, date),
            )
            .await?;

        let request = SlotRequest::new(provider_id, date, duration_minutes).with_step(step);
        Ok(compute_slots(&request, &schedule, &blackouts, &appointments))
    }

    /// Validates and persists a booking, returning the new appointment id.
    pub async fn book(&self, request: BookingRequest) -> Result<i64, BookingError> {
        if request.customer_name.trim().is_empty() {
            return Err(BookingError::Validation(
                "customer_name must not be empty".to_string(),
            ));
        }
        if request.service_name.trim().is_empty() {
            return Err(BookingError::Validation(
                "service_name must not be empty".to_string(),
            ));
        }
        self.check_duration(request.duration_minutes)?;

        let interval = Interval::starting_at(request.start, request.duration_minutes)
            .map_err(|e| BookingError::Validation(e.to_string()))?;
        let phone = normalize_phone(&request.customer_phone, &self.settings.default_country_code)
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "customer_phone '{}' is not a valid phone number",
                    request.customer_phone
                ))
            })?;

        let schedule = self
            .bounded(
                "schedule lookup",
                self.repository.get_weekly_schedule(request.provider_id),
            )
            .await?;
        let open = schedule.hours_for(request.date).ok_or_else(|| {
            BookingError::Validation(format!(
                "provider {} is closed on {}",
                request.provider_id, request.date
            ))
        })?;
        if !open.contains(&interval) {
            return Err(BookingError::Validation(format!(
                "{} is outside the opening hours {}",
                interval, open
            )));
        }

        let status = request.status.unwrap_or(AppointmentStatus::Pending);
        if !status.blocks_time() {
            return Err(BookingError::Validation(format!(
                "cannot book an appointment with status {}",
                status
            )));
        }

        let appointment = NewAppointment {
            provider_id: request.provider_id,
            customer_name: request.customer_name.trim().to_string(),
            customer_phone: phone,
            service_name: request.service_name.trim().to_string(),
            date: request.date,
            interval,
            status,
        };
        match self
            .bounded("booking insert", self.repository.insert_appointment(appointment))
            .await
        {
            Ok(id) => {
                info!(
                    "Booked appointment {} for provider {} on {} {}",
                    id, request.provider_id, request.date, interval
                );
                Ok(id)
            }
            Err(BookingError::SlotNoLongerAvailable(reason)) => {
                warn!(
                    "Slot {} {} of provider {} was taken: {}",
                    request.date, interval, request.provider_id, reason
                );
                Err(BookingError::SlotNoLongerAvailable(reason))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_appointment(&self, id: i64) -> Result<Appointment, BookingError> {
        self.bounded("appointment lookup", self.repository.get_appointment(id))
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("appointment {}", id)))
    }

    /// Moves an appointment to `status`; canceling frees its slot.
    pub async fn update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        let updated = self
            .bounded("status update", self.repository.update_status(id, status))
            .await?;
        if !updated {
            return Err(BookingError::NotFound(format!("appointment {}", id)));
        }
        debug!("Appointment {} is now {}", id, status);
        Ok(())
    }
}
