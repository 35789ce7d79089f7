#[cfg(test)]
mod tests {
    use crate::availability::{compute_slots, SlotRequest};
    use crate::model::{
        overlaps, Appointment, AppointmentStatus, BlackoutWindow, DateKey, Interval,
        WeeklySchedule,
    };
    use proptest::prelude::*;

    const PROVIDER: i64 = 7;

    // Helper function to build a valid interval from a start and a length
    fn clamped(start: u16, len: u16) -> Interval {
        let end = (start + len.max(1)).min(1439);
        Interval::from_minutes(start.min(end - 1), end).expect("valid interval")
    }

    fn appointment(id: i64, date: DateKey, interval: Interval, status: AppointmentStatus) -> Appointment {
        Appointment {
            id,
            provider_id: PROVIDER,
            customer_name: "Prop Test".into(),
            customer_phone: "+41790000000".into(),
            service_name: "Service".into(),
            date,
            interval,
            status,
            reminder_sent: false,
            reminder_attempts: 0,
        }
    }

    fn status_strategy() -> impl Strategy<Value = AppointmentStatus> {
        prop_oneof![
            Just(AppointmentStatus::Pending),
            Just(AppointmentStatus::Confirmed),
            Just(AppointmentStatus::Completed),
            Just(AppointmentStatus::Canceled),
            Just(AppointmentStatus::NoShow),
        ]
    }

    proptest! {
        // Slots are ascending, unique, inside opening hours and clear of every blocker
        #[test]
        fn test_slots_respect_hours_and_blockers(
            open_start in 0u16..720,
            open_len in 1u16..700,
            duration in 5u16..180,
            step in 5u16..60,
            weekday_offset in 0u32..7,
            blackout_specs in prop::collection::vec((0u16..1400, 1u16..120, any::<bool>()), 0..5),
            appointment_specs in prop::collection::vec((0u16..1400, 5u16..120, status_strategy()), 0..8),
        ) {
            // 2025-05-05 is a Monday
            let date = DateKey::from_ymd(2025, 5, 5 + weekday_offset).unwrap();
            let open = clamped(open_start, open_len);
            let schedule = WeeklySchedule::uniform(&[0, 1, 2, 3, 4, 5, 6], open).unwrap();

            let blackouts: Vec<BlackoutWindow> = blackout_specs
                .iter()
                .map(|(start, len, recurring)| {
                    let interval = clamped(*start, *len);
                    if *recurring {
                        BlackoutWindow::recurring(PROVIDER, interval)
                    } else {
                        BlackoutWindow::on_date(PROVIDER, date, interval)
                    }
                })
                .collect();
            let existing: Vec<Appointment> = appointment_specs
                .iter()
                .enumerate()
                .map(|(i, (start, len, status))| {
                    appointment(i as i64 + 1, date, clamped(*start, *len), *status)
                })
                .collect();

            let request = SlotRequest::new(PROVIDER, date, duration).with_step(step);
            let slots = compute_slots(&request, &schedule, &blackouts, &existing);

            for pair in slots.windows(2) {
                prop_assert!(pair[0] < pair[1], "slots must be strictly ascending");
            }

            for slot in &slots {
                let occupied = Interval::starting_at(*slot, duration).unwrap();
                prop_assert!(open.contains(&occupied), "slot {} leaves {}", occupied, open);
                prop_assert_eq!((slot.minutes() - open.start().minutes()) % step, 0);

                for blackout in &blackouts {
                    prop_assert!(!overlaps(&blackout.interval, &occupied));
                }
                for booked in existing.iter().filter(|a| a.status.blocks_time()) {
                    prop_assert!(!overlaps(&booked.interval, &occupied));
                }
            }
        }

        // Without any blocker every grid point that fits is offered
        #[test]
        fn test_empty_day_offers_full_grid(
            open_start in 0u16..720,
            open_len in 1u16..700,
            duration in 5u16..180,
            step in 5u16..60,
        ) {
            let date = DateKey::from_ymd(2025, 5, 7).unwrap();
            let open = clamped(open_start, open_len);
            let schedule = WeeklySchedule::uniform(&[2], open).unwrap();

            let slots = compute_slots(&SlotRequest::new(PROVIDER, date, duration).with_step(step), &schedule, &[], &[]);

            let expected = if duration > open.duration_minutes() {
                0
            } else {
                usize::from((open.duration_minutes() - duration) / step) + 1
            };
            prop_assert_eq!(slots.len(), expected);
        }
    }
}
