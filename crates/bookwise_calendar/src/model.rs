// --- File: crates/bookwise_calendar/src/model.rs ---
//! Calendar value types: time of day, date, interval, weekly schedule and the
//! records the availability engine reads (blackouts, appointments).

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minutes in a day; `TimeOfDay` is always below this.
pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
    #[error("Invalid interval: start {start} must be before end {end}")]
    InvalidInterval { start: String, end: String },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid weekday index: {0} (expected 0-6, Monday = 0)")]
    InvalidWeekday(u8),
    #[error("Unknown appointment status: {0}")]
    InvalidStatus(String),
}

// --- TimeOfDay ---

/// Minutes since local midnight, `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_minutes(minutes: u16) -> Result<Self, CalendarError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(CalendarError::InvalidTime(format!(
                "{} minutes is past the end of the day",
                minutes
            )));
        }
        Ok(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, CalendarError> {
        if hour > 23 || minute > 59 {
            return Err(CalendarError::InvalidTime(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Adds `minutes`, failing when the result leaves the day.
    pub fn checked_add(self, minutes: u16) -> Option<TimeOfDay> {
        let total = self.0.checked_add(minutes)?;
        (total < MINUTES_PER_DAY).then_some(TimeOfDay(total))
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

/// Minutes since midnight of `time`.
pub fn to_minutes(time: TimeOfDay) -> u16 {
    time.minutes()
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = CalendarError;

    /// Parses `HH:MM` (seconds, if present, must be zero: `HH:MM:00`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|_| CalendarError::InvalidTime(s.to_string()))?;
        if chrono::Timelike::second(&time) != 0 {
            return Err(CalendarError::InvalidTime(s.to_string()));
        }
        let minutes = chrono::Timelike::hour(&time) * 60 + chrono::Timelike::minute(&time);
        // hour <= 23 and minute <= 59 keep this below 1440
        Ok(Self(minutes as u16))
    }
}

impl From<NaiveTime> for TimeOfDay {
    /// Truncates seconds.
    fn from(time: NaiveTime) -> Self {
        let minutes = chrono::Timelike::hour(&time) * 60 + chrono::Timelike::minute(&time);
        Self(minutes as u16)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// --- DateKey ---

/// A timezone-naive calendar date in the business's local time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CalendarError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CalendarError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// Day of the week, Monday = 0 ... Sunday = 6.
    pub fn weekday(self) -> u8 {
        self.0.weekday().num_days_from_monday() as u8
    }

    /// Local date-time of `time` on this date.
    pub fn at(self, time: TimeOfDay) -> NaiveDateTime {
        self.0.and_time(time.to_naive_time())
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| CalendarError::InvalidDate(s.to_string()))
    }
}

// --- Interval ---

/// Half-open `[start, end)` within one day. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: TimeOfDay,
    end: TimeOfDay,
}

#[derive(Deserialize)]
struct RawInterval {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<RawInterval> for Interval {
    type Error = CalendarError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, CalendarError> {
        if start >= end {
            return Err(CalendarError::InvalidInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Interval of `duration_minutes` starting at `start`.
    pub fn starting_at(start: TimeOfDay, duration_minutes: u16) -> Result<Self, CalendarError> {
        let end = start
            .checked_add(duration_minutes)
            .ok_or_else(|| CalendarError::InvalidInterval {
                start: start.to_string(),
                end: format!("+{} min", duration_minutes),
            })?;
        Self::new(start, end)
    }

    /// Builds an interval from raw minute values as stored in the database.
    pub fn from_minutes(start: u16, end: u16) -> Result<Self, CalendarError> {
        Self::new(TimeOfDay::from_minutes(start)?, TimeOfDay::from_minutes(end)?)
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }

    /// True when the two half-open intervals share at least one minute.
    pub fn overlaps(&self, other: &Interval) -> bool {
        overlaps(self, other)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// `a.start < b.end && b.start < a.end`; touching endpoints do not overlap.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start < b.end && b.start < a.end
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// --- WeeklySchedule ---

/// Opening hours of one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: Interval,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Weekday (Monday = 0) to opening hours. `None` or inactive means closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    days: [Option<DayHours>; 7],
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same opening hours on every listed weekday.
    pub fn uniform(weekdays: &[u8], open: Interval) -> Result<Self, CalendarError> {
        let mut schedule = Self::new();
        for &weekday in weekdays {
            schedule.set_day(weekday, Some(DayHours { open, active: true }))?;
        }
        Ok(schedule)
    }

    pub fn set_day(&mut self, weekday: u8, hours: Option<DayHours>) -> Result<(), CalendarError> {
        let slot = self
            .days
            .get_mut(usize::from(weekday))
            .ok_or(CalendarError::InvalidWeekday(weekday))?;
        *slot = hours;
        Ok(())
    }

    pub fn day(&self, weekday: u8) -> Option<&DayHours> {
        self.days.get(usize::from(weekday)).and_then(Option::as_ref)
    }

    /// Open interval on `date`, `None` on a closed day.
    pub fn hours_for(&self, date: DateKey) -> Option<Interval> {
        self.day(date.weekday())
            .filter(|hours| hours.active)
            .map(|hours| hours.open)
    }

    /// Configured days as `(weekday, hours)`, inactive ones included.
    pub fn days(&self) -> impl Iterator<Item = (u8, &DayHours)> {
        self.days
            .iter()
            .enumerate()
            .filter_map(|(idx, hours)| hours.as_ref().map(|h| (idx as u8, h)))
    }
}

// --- BlackoutWindow ---

/// A time range in which nothing can be booked, on one date or every date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackoutWindow {
    pub id: Option<i64>,
    pub provider_id: i64,
    /// Ignored when `recurring` is set.
    pub date: Option<DateKey>,
    pub interval: Interval,
    pub recurring: bool,
}

impl BlackoutWindow {
    pub fn recurring(provider_id: i64, interval: Interval) -> Self {
        Self {
            id: None,
            provider_id,
            date: None,
            interval,
            recurring: true,
        }
    }

    pub fn on_date(provider_id: i64, date: DateKey, interval: Interval) -> Self {
        Self {
            id: None,
            provider_id,
            date: Some(date),
            interval,
            recurring: false,
        }
    }

    pub fn applies_to(&self, date: DateKey) -> bool {
        self.recurring || self.date == Some(date)
    }
}

// --- Appointments ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Whether an appointment in this status occupies its time slot.
    pub fn blocks_time(&self) -> bool {
        !matches!(self, AppointmentStatus::Canceled | AppointmentStatus::NoShow)
    }

    /// Whether an appointment in this status still gets a reminder.
    pub fn is_reminder_eligible(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "canceled" => Ok(AppointmentStatus::Canceled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(CalendarError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub provider_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_name: String,
    pub date: DateKey,
    pub interval: Interval,
    pub status: AppointmentStatus,
    pub reminder_sent: bool,
    /// Failed reminder deliveries so far.
    pub reminder_attempts: u32,
}

impl Appointment {
    /// Local start date-time in the business time zone.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.at(self.interval.start())
    }
}

/// Payload for booking a new appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub provider_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_name: String,
    pub date: DateKey,
    pub interval: Interval,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Pending
}
