//! Repository for providers, opening hours, blackouts, appointments and
//! reminder bookkeeping.

use crate::error::DbError;
use bookwise_calendar::{
    Appointment, AppointmentStatus, BlackoutWindow, DateKey, NewAppointment, WeeklySchedule,
};
use bookwise_common::DeliveryStatus;
use bookwise_config::ReminderChannel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Display data of a service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
}

/// One delivery attempt of a reminder. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: Option<i64>,
    pub appointment_id: i64,
    pub channel: ReminderChannel,
    pub destination: String,
    pub rendered_message: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    pub error: Option<String>,
}

/// Storage operations the booking and reminder flows rely on.
///
/// Two operations carry the concurrency guarantees of the system:
/// [`insert_appointment`](Self::insert_appointment) re-checks for overlaps
/// in the same transaction that inserts, and
/// [`mark_reminder_sent`](Self::mark_reminder_sent) is a single conditional
/// update whose row count tells the caller whether it won the claim.
pub trait BookingRepository {
    /// Create the tables if they don't exist yet
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    // --- providers ---

    fn get_provider(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Provider>, DbError>> + Send;

    fn upsert_provider(
        &self,
        provider: Provider,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    // --- opening hours and blackouts ---

    /// Opening hours of a provider; a provider without rows is closed every day
    fn get_weekly_schedule(
        &self,
        provider_id: i64,
    ) -> impl Future<Output = Result<WeeklySchedule, DbError>> + Send;

    /// Replace all opening hours of a provider
    fn set_weekly_schedule(
        &self,
        provider_id: i64,
        schedule: WeeklySchedule,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Blackouts of a provider that apply to `date` (dated on it, or recurring)
    fn get_blackouts(
        &self,
        provider_id: i64,
        date: DateKey,
    ) -> impl Future<Output = Result<Vec<BlackoutWindow>, DbError>> + Send;

    /// Store a blackout and return its id
    fn add_blackout(
        &self,
        blackout: BlackoutWindow,
    ) -> impl Future<Output = Result<i64, DbError>> + Send;

    /// `true` if a blackout was deleted
    fn delete_blackout(&self, id: i64) -> impl Future<Output = Result<bool, DbError>> + Send;

    // --- appointments ---

    /// All appointments of a provider on `date`, in any status, ordered by start
    fn get_appointments(
        &self,
        provider_id: i64,
        date: DateKey,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    fn get_appointment(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// Insert an appointment unless it overlaps a time-blocking appointment or
    /// an applicable blackout of the same provider.
    ///
    /// Fails with [`DbError::SlotNoLongerAvailable`] when the slot was taken
    /// since availability was computed. Nothing is overwritten in that case.
    fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> impl Future<Output = Result<i64, DbError>> + Send;

    /// `true` if the appointment existed.
    ///
    /// Moving to a time-blocking status re-runs the insert guard against the
    /// other appointments and blackouts of that day and fails with
    /// [`DbError::SlotNoLongerAvailable`] when the slot was taken meanwhile.
    fn update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    // --- reminders ---

    /// Unreminded pending/confirmed appointments dated `from_date..=to_date`
    /// with fewer than `max_attempts` failed deliveries, ordered by start.
    fn find_reminder_candidates(
        &self,
        from_date: DateKey,
        to_date: DateKey,
        max_attempts: u32,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    /// Claim the reminder of an appointment.
    ///
    /// Returns the number of rows changed: 1 for the caller that flipped
    /// `reminder_sent`, 0 for everybody else.
    fn mark_reminder_sent(&self, id: i64) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Count one failed delivery; leaves `reminder_sent` untouched
    fn record_failed_attempt(&self, id: i64) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Append a delivery record and return its id
    fn append_reminder_record(
        &self,
        record: ReminderRecord,
    ) -> impl Future<Output = Result<i64, DbError>> + Send;

    /// Delivery records of an appointment, oldest first
    fn reminder_records(
        &self,
        appointment_id: i64,
    ) -> impl Future<Output = Result<Vec<ReminderRecord>, DbError>> + Send;
}
