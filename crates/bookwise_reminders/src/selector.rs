//! Which appointments are due for a reminder right now.

use crate::error::ReminderError;
use crate::settings::ReminderSettings;
use bookwise_calendar::{Appointment, DateKey};
use bookwise_db::BookingRepository;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, warn};

/// Half-open `[now + lead, now + lead + tolerance)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    from: DateTime<Utc>,
    until: DateTime<Utc>,
}

impl ReminderWindow {
    pub fn new(now: DateTime<Utc>, lead_time_minutes: i64, tolerance_minutes: i64) -> Self {
        let from = now + Duration::minutes(lead_time_minutes);
        let until = from + Duration::minutes(tolerance_minutes.max(0));
        Self { from, until }
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.until
    }

    /// First and last local calendar date the window touches in `tz`.
    pub fn local_dates(&self, tz: Tz) -> (DateKey, DateKey) {
        let first = self.from.with_timezone(&tz).date_naive();
        let last = self.until.with_timezone(&tz).date_naive();
        (DateKey::new(first), DateKey::new(last))
    }
}

/// Converts a local wall-clock time in `tz` to UTC.
///
/// An ambiguous time (clocks going back) resolves to the earlier instant. A
/// time inside the spring-forward gap is read as if the clock had not jumped
/// yet, i.e. it lands one gap later.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// The full reminder predicate for one appointment.
pub fn is_due(appointment: &Appointment, window: &ReminderWindow, tz: Tz, max_attempts: u32) -> bool {
    appointment.status.is_reminder_eligible()
        && !appointment.reminder_sent
        && appointment.reminder_attempts < max_attempts
        && local_to_utc(appointment.starts_at(), tz).is_some_and(|start| window.contains(start))
}

/// A reminder whose earlier delivery failed stays due on later ticks while
/// the appointment is still ahead and attempts remain.
pub fn is_retry_due(
    appointment: &Appointment,
    now: DateTime<Utc>,
    window: &ReminderWindow,
    tz: Tz,
    max_attempts: u32,
) -> bool {
    appointment.status.is_reminder_eligible()
        && !appointment.reminder_sent
        && appointment.reminder_attempts > 0
        && appointment.reminder_attempts < max_attempts
        && local_to_utc(appointment.starts_at(), tz)
            .is_some_and(|start| now < start && start < window.until())
}

/// Loads due appointments from the repository.
pub struct ReminderSelector<R> {
    repository: Arc<R>,
    settings: Arc<ReminderSettings>,
}

impl<R> ReminderSelector<R>
where
    R: BookingRepository + Send + Sync,
{
    pub fn new(repository: Arc<R>, settings: Arc<ReminderSettings>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Appointments due at `now` with the configured lead time and tolerance.
    pub async fn select_due(&self, now: DateTime<Utc>) -> Result<Vec<Appointment>, ReminderError> {
        self.select_due_with(
            now,
            self.settings.lead_time_minutes,
            self.settings.tolerance_minutes,
        )
        .await
    }

    /// Appointments starting in `[now + lead, now + lead + tolerance)` plus
    /// failed reminders still worth retrying, ascending by start, at most
    /// `batch_limit`.
    pub async fn select_due_with(
        &self,
        now: DateTime<Utc>,
        lead_time_minutes: i64,
        tolerance_minutes: i64,
    ) -> Result<Vec<Appointment>, ReminderError> {
        let settings = &self.settings;
        let window = ReminderWindow::new(now, lead_time_minutes, tolerance_minutes);
        let (_, to_date) = window.local_dates(settings.timezone);
        // retries can start anywhere between now and the window
        let from_date = DateKey::new(now.with_timezone(&settings.timezone).date_naive());

        let candidates = tokio::time::timeout(
            settings.query_timeout,
            self.repository
                .find_reminder_candidates(from_date, to_date, settings.max_attempts),
        )
        .await
        .map_err(|_| ReminderError::Timeout {
            operation: "reminder candidate query",
            timeout: settings.query_timeout,
        })??;

        let mut due: Vec<(DateTime<Utc>, Appointment)> = candidates
            .into_iter()
            .filter(|a| {
                is_due(a, &window, settings.timezone, settings.max_attempts)
                    || is_retry_due(a, now, &window, settings.timezone, settings.max_attempts)
            })
            .filter_map(|a| local_to_utc(a.starts_at(), settings.timezone).map(|start| (start, a)))
            .collect();
        due.sort_by_key(|(start, a)| (*start, a.id));

        if due.len() > settings.batch_limit {
            warn!(
                "{} appointments due, dispatching the first {} this tick",
                due.len(),
                settings.batch_limit
            );
            due.truncate(settings.batch_limit);
        }
        debug!(
            "Reminder window {} .. {}: {} due",
            window.from(),
            window.until(),
            due.len()
        );
        Ok(due.into_iter().map(|(_, a)| a).collect())
    }
}
