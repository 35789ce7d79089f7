// --- File: crates/bookwise_calendar/src/lib.rs ---
pub mod availability;
#[cfg(test)]
mod availability_proptest;
pub mod conflict;
pub mod model;

pub use availability::{candidate_starts, compute_slots, SlotRequest, DEFAULT_STEP_MINUTES};
pub use conflict::{conflicts_with, find_conflict, BusyIntervals, Conflict};
pub use model::{
    overlaps, to_minutes, Appointment, AppointmentStatus, BlackoutWindow, CalendarError, DateKey,
    DayHours, Interval, NewAppointment, TimeOfDay, WeeklySchedule, MINUTES_PER_DAY,
};
