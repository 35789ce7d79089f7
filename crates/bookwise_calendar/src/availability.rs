// --- File: crates/bookwise_calendar/src/availability.rs ---
use crate::conflict::BusyIntervals;
use crate::model::{Appointment, BlackoutWindow, DateKey, Interval, TimeOfDay, WeeklySchedule};
use tracing::debug;

/// Slot grid used when the caller does not choose one.
pub const DEFAULT_STEP_MINUTES: u16 = 30;

/// Input of [`compute_slots`] apart from the schedule and blockers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub provider_id: i64,
    pub date: DateKey,
    /// Length of the service being booked.
    pub service_duration_minutes: u16,
    /// Distance between two candidate start times.
    pub step_minutes: u16,
}

impl SlotRequest {
    pub fn new(provider_id: i64, date: DateKey, service_duration_minutes: u16) -> Self {
        Self {
            provider_id,
            date,
            service_duration_minutes,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }

    pub fn with_step(mut self, step_minutes: u16) -> Self {
        self.step_minutes = step_minutes;
        self
    }
}

/// Candidate start times on the open interval, before any blocker is applied.
///
/// Steps from opening time while `start + duration <= closing time`; a last
/// partial step that would run past closing is dropped.
pub fn candidate_starts(open: Interval, duration: u16, step: u16) -> Vec<TimeOfDay> {
    if duration == 0 || step == 0 || duration > open.duration_minutes() {
        return Vec::new();
    }
    let last_start = open.end().minutes() - duration;
    (open.start().minutes()..=last_start)
        .step_by(usize::from(step))
        .filter_map(|m| TimeOfDay::from_minutes(m).ok())
        .collect()
}

/// Computes the bookable start times for one provider on one date.
///
/// A closed day (no or inactive opening hours) yields an empty list. Blackouts
/// that apply to the date and non-canceled appointments of the same provider on
/// the same date remove every candidate whose occupied interval
/// `[start, start + duration)` overlaps them. The result is ascending, free of
/// duplicates and depends on nothing but the arguments.
pub fn compute_slots(
    request: &SlotRequest,
    schedule: &WeeklySchedule,
    blackouts: &[BlackoutWindow],
    existing: &[Appointment],
) -> Vec<TimeOfDay> {
    let Some(open) = schedule.hours_for(request.date) else {
        debug!(
            "Provider {} is closed on {} (weekday {})",
            request.provider_id,
            request.date,
            request.date.weekday()
        );
        return Vec::new();
    };

    let duration = request.service_duration_minutes;
    let candidates = candidate_starts(open, duration, request.step_minutes);
    let busy = BusyIntervals::collect(request.provider_id, request.date, blackouts, existing);
    let mut sweep = busy.sweep();

    let slots: Vec<TimeOfDay> = candidates
        .into_iter()
        .filter(|start| match Interval::starting_at(*start, duration) {
            Ok(occupied) => sweep.is_free(&occupied),
            Err(_) => false,
        })
        .collect();

    debug!(
        "Provider {} on {}: open {}, {} busy intervals, {} free slots of {} min",
        request.provider_id,
        request.date,
        open,
        busy.intervals().len(),
        slots.len(),
        duration
    );
    slots
}
