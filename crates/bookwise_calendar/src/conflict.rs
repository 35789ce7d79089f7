// --- File: crates/bookwise_calendar/src/conflict.rs ---
//! Overlap checks shared by slot generation and the write-time booking guard.

use crate::model::{overlaps, Appointment, BlackoutWindow, DateKey, Interval};
use serde::Serialize;

/// What a candidate interval collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    Blackout { id: Option<i64>, interval: Interval },
    Appointment { id: i64, interval: Interval },
}

/// First blocker in `blockers` that `candidate` overlaps.
pub fn conflicts_with(candidate: &Interval, blockers: &[Interval]) -> Option<Interval> {
    blockers.iter().find(|b| overlaps(b, candidate)).copied()
}

/// Blackouts that apply to `date` for `provider_id`.
pub fn applicable_blackouts<'a>(
    provider_id: i64,
    date: DateKey,
    blackouts: &'a [BlackoutWindow],
) -> impl Iterator<Item = &'a BlackoutWindow> + 'a {
    blackouts
        .iter()
        .filter(move |b| b.provider_id == provider_id && b.applies_to(date))
}

/// Appointments of `provider_id` on `date` that occupy their slot.
pub fn blocking_appointments<'a>(
    provider_id: i64,
    date: DateKey,
    appointments: &'a [Appointment],
) -> impl Iterator<Item = &'a Appointment> + 'a {
    appointments
        .iter()
        .filter(move |a| a.provider_id == provider_id && a.date == date && a.status.blocks_time())
}

/// First blackout or appointment that `candidate` overlaps, blackouts first.
pub fn find_conflict(
    provider_id: i64,
    date: DateKey,
    candidate: &Interval,
    blackouts: &[BlackoutWindow],
    appointments: &[Appointment],
) -> Option<Conflict> {
    if let Some(b) =
        applicable_blackouts(provider_id, date, blackouts).find(|b| overlaps(&b.interval, candidate))
    {
        return Some(Conflict::Blackout {
            id: b.id,
            interval: b.interval,
        });
    }
    blocking_appointments(provider_id, date, appointments)
        .find(|a| overlaps(&a.interval, candidate))
        .map(|a| Conflict::Appointment {
            id: a.id,
            interval: a.interval,
        })
}

/// Busy time of one provider on one date, sorted and merged.
///
/// Built once per availability query so each candidate is checked with a
/// forward-only sweep instead of scanning every blocker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyIntervals {
    merged: Vec<Interval>,
}

impl BusyIntervals {
    pub fn collect(
        provider_id: i64,
        date: DateKey,
        blackouts: &[BlackoutWindow],
        appointments: &[Appointment],
    ) -> Self {
        let busy = applicable_blackouts(provider_id, date, blackouts)
            .map(|b| b.interval)
            .chain(blocking_appointments(provider_id, date, appointments).map(|a| a.interval))
            .collect();
        Self::from_intervals(busy)
    }

    pub fn from_intervals(mut busy: Vec<Interval>) -> Self {
        busy.sort_by_key(|i| (i.start(), i.end()));
        let mut merged: Vec<Interval> = Vec::with_capacity(busy.len());
        for interval in busy {
            match merged.last_mut() {
                // touching intervals are merged too, the result covers the same minutes
                Some(last) if interval.start() <= last.end() => {
                    if interval.end() > last.end() {
                        *last = Interval::new(last.start(), interval.end()).unwrap_or(*last);
                    }
                }
                _ => merged.push(interval),
            }
        }
        Self { merged }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Cursor for checking candidates in ascending start order.
    pub fn sweep(&self) -> BusySweep<'_> {
        BusySweep {
            busy: &self.merged,
            next: 0,
        }
    }
}

/// Forward-only overlap checker over [`BusyIntervals`].
///
/// Candidates must be passed with non-decreasing start and end.
pub struct BusySweep<'a> {
    busy: &'a [Interval],
    next: usize,
}

impl BusySweep<'_> {
    pub fn is_free(&mut self, candidate: &Interval) -> bool {
        while let Some(busy) = self.busy.get(self.next) {
            if busy.end() <= candidate.start() {
                self.next += 1;
                continue;
            }
            return !overlaps(busy, candidate);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppointmentStatus, TimeOfDay};

    fn iv(start: &str, end: &str) -> Interval {
        Interval::new(
            start.parse::<TimeOfDay>().unwrap(),
            end.parse::<TimeOfDay>().unwrap(),
        )
        .unwrap()
    }

    fn appointment(id: i64, date: DateKey, interval: Interval, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            provider_id: 1,
            customer_name: "Anna".into(),
            customer_phone: "+41790000000".into(),
            service_name: "Haircut".into(),
            date,
            interval,
            status,
            reminder_sent: false,
            reminder_attempts: 0,
        }
    }

    #[test]
    fn test_find_conflict_reports_blocker() {
        let date = DateKey::from_ymd(2025, 5, 5).unwrap();
        let blackouts = vec![BlackoutWindow {
            id: Some(3),
            ..BlackoutWindow::recurring(1, iv("12:00", "13:00"))
        }];
        let appointments = vec![appointment(
            9,
            date,
            iv("14:00", "14:30"),
            AppointmentStatus::Confirmed,
        )];

        assert_eq!(
            find_conflict(1, date, &iv("12:30", "13:00"), &blackouts, &appointments),
            Some(Conflict::Blackout {
                id: Some(3),
                interval: iv("12:00", "13:00")
            })
        );
        assert_eq!(
            find_conflict(1, date, &iv("13:45", "14:15"), &blackouts, &appointments),
            Some(Conflict::Appointment {
                id: 9,
                interval: iv("14:00", "14:30")
            })
        );
        assert_eq!(
            find_conflict(1, date, &iv("13:00", "14:00"), &blackouts, &appointments),
            None
        );
        // other provider
        assert_eq!(
            find_conflict(2, date, &iv("12:30", "13:00"), &blackouts, &appointments),
            None
        );
    }

    #[test]
    fn test_canceled_and_no_show_do_not_block() {
        let date = DateKey::from_ymd(2025, 5, 5).unwrap();
        let appointments = vec![
            appointment(1, date, iv("10:00", "10:30"), AppointmentStatus::Canceled),
            appointment(2, date, iv("10:00", "10:30"), AppointmentStatus::NoShow),
        ];
        assert_eq!(
            find_conflict(1, date, &iv("10:00", "10:30"), &[], &appointments),
            None
        );
    }

    #[test]
    fn test_conflicts_with_touching_is_free() {
        let blockers = [iv("10:00", "11:00"), iv("12:00", "13:00")];
        assert_eq!(conflicts_with(&iv("11:00", "12:00"), &blockers), None);
        assert_eq!(
            conflicts_with(&iv("11:30", "12:15"), &blockers),
            Some(iv("12:00", "13:00"))
        );
    }

    #[test]
    fn test_busy_intervals_merge_overlapping_and_touching() {
        let busy = BusyIntervals::from_intervals(vec![
            iv("14:00", "15:00"),
            iv("09:00", "10:00"),
            iv("09:30", "11:00"),
            iv("11:00", "11:30"),
        ]);
        assert_eq!(
            busy.intervals(),
            &[iv("09:00", "11:30"), iv("14:00", "15:00")]
        );
    }

    #[test]
    fn test_sweep_matches_pairwise_overlap() {
        let busy = BusyIntervals::from_intervals(vec![iv("10:00", "11:00"), iv("12:00", "12:30")]);
        let mut sweep = busy.sweep();
        assert!(sweep.is_free(&iv("09:00", "10:00")));
        assert!(!sweep.is_free(&iv("09:30", "10:30")));
        assert!(sweep.is_free(&iv("11:00", "12:00")));
        assert!(!sweep.is_free(&iv("11:30", "12:30")));
        assert!(sweep.is_free(&iv("12:30", "13:00")));
    }
}
