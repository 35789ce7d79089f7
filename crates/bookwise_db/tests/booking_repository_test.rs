use bookwise_calendar::{
    compute_slots, AppointmentStatus, BlackoutWindow, DateKey, DayHours, Interval, NewAppointment,
    SlotRequest, TimeOfDay, WeeklySchedule,
};
use bookwise_common::DeliveryStatus;
use bookwise_config::ReminderChannel;
use bookwise_db::{BookingRepository, DbClient, DbError, Provider, ReminderRecord, SqlBookingRepository};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tokio::task::JoinSet;
use uuid::Uuid;

const PROVIDER: i64 = 1;

async fn repository() -> SqlBookingRepository {
    let client = DbClient::from_url("sqlite::memory:")
        .await
        .expect("in-memory database");
    seeded(client).await
}

/// A SQLite file with a pool of several connections, so concurrent callers
/// really race each other.
struct FileDatabase {
    path: PathBuf,
}

impl FileDatabase {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("bookwise-{}.db", Uuid::new_v4()));
        Self { path }
    }

    async fn repository(&self) -> SqlBookingRepository {
        let url = format!("sqlite:{}", self.path.display());
        let client = DbClient::from_url(&url).await.expect("file database");
        seeded(client).await
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn seeded(client: DbClient) -> SqlBookingRepository {
    let repository = SqlBookingRepository::new(client);
    repository.init_schema().await.expect("schema");
    repository
        .upsert_provider(Provider {
            id: PROVIDER,
            name: "Dr. Keller".to_string(),
        })
        .await
        .expect("provider");
    repository
}

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

fn iv(start: &str, end: &str) -> Interval {
    Interval::new(t(start), t(end)).unwrap()
}

fn monday() -> DateKey {
    DateKey::from_ymd(2025, 5, 5).unwrap()
}

fn new_appointment(date: DateKey, interval: Interval) -> NewAppointment {
    NewAppointment {
        provider_id: PROVIDER,
        customer_name: "Max Muster".to_string(),
        customer_phone: "079 123 45 67".to_string(),
        service_name: "Consultation".to_string(),
        date,
        interval,
        status: AppointmentStatus::Pending,
    }
}

#[tokio::test]
async fn test_schema_init_is_idempotent() {
    let repository = repository().await;
    repository.init_schema().await.expect("second init");
    assert!(repository.db_client().is_healthy().await);
}

#[tokio::test]
async fn test_provider_upsert_and_lookup() {
    let repository = repository().await;
    repository
        .upsert_provider(Provider {
            id: PROVIDER,
            name: "Dr. Anna Keller".to_string(),
        })
        .await
        .unwrap();

    let provider = repository.get_provider(PROVIDER).await.unwrap();
    assert_eq!(provider.map(|p| p.name), Some("Dr. Anna Keller".to_string()));
    assert_eq!(repository.get_provider(42).await.unwrap(), None);
}

#[tokio::test]
async fn test_weekly_schedule_round_trip() {
    let repository = repository().await;
    let mut schedule = WeeklySchedule::uniform(&[0, 1, 2], iv("09:00", "18:00")).unwrap();
    schedule
        .set_day(
            5,
            Some(DayHours {
                open: iv("10:00", "14:00"),
                active: false,
            }),
        )
        .unwrap();

    repository
        .set_weekly_schedule(PROVIDER, schedule.clone())
        .await
        .unwrap();
    assert_eq!(repository.get_weekly_schedule(PROVIDER).await.unwrap(), schedule);

    // replacing drops days that are no longer listed
    let shorter = WeeklySchedule::uniform(&[4], iv("08:00", "12:00")).unwrap();
    repository
        .set_weekly_schedule(PROVIDER, shorter.clone())
        .await
        .unwrap();
    assert_eq!(repository.get_weekly_schedule(PROVIDER).await.unwrap(), shorter);

    // unknown provider is closed every day
    assert_eq!(
        repository.get_weekly_schedule(99).await.unwrap(),
        WeeklySchedule::new()
    );
}

#[tokio::test]
async fn test_blackouts_filtered_by_date() {
    let repository = repository().await;
    let tuesday = DateKey::from_ymd(2025, 5, 6).unwrap();

    let lunch = repository
        .add_blackout(BlackoutWindow::recurring(PROVIDER, iv("12:00", "13:00")))
        .await
        .unwrap();
    repository
        .add_blackout(BlackoutWindow::on_date(PROVIDER, tuesday, iv("15:00", "16:00")))
        .await
        .unwrap();

    let on_monday = repository.get_blackouts(PROVIDER, monday()).await.unwrap();
    let on_tuesday = repository.get_blackouts(PROVIDER, tuesday).await.unwrap();
    assert_eq!(on_monday.len(), 1);
    assert_eq!(on_monday[0].id, Some(lunch));
    assert!(on_monday[0].recurring);
    assert_eq!(on_tuesday.len(), 2);

    assert!(repository.delete_blackout(lunch).await.unwrap());
    assert!(!repository.delete_blackout(lunch).await.unwrap());
    assert!(repository
        .get_blackouts(PROVIDER, monday())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dated_blackout_requires_date() {
    let repository = repository().await;
    let mut broken = BlackoutWindow::recurring(PROVIDER, iv("12:00", "13:00"));
    broken.recurring = false;

    let result = repository.add_blackout(broken).await;
    assert!(matches!(result, Err(DbError::DataError(_))));
}

#[tokio::test]
async fn test_insert_then_recompute_excludes_slot() {
    let repository = repository().await;
    let schedule = WeeklySchedule::uniform(&[0, 1, 2, 3, 4], iv("09:00", "12:00")).unwrap();
    repository
        .set_weekly_schedule(PROVIDER, schedule)
        .await
        .unwrap();
    let request = SlotRequest::new(PROVIDER, monday(), 30);

    let load = |repository: SqlBookingRepository| async move {
        let schedule = repository.get_weekly_schedule(PROVIDER).await.unwrap();
        let blackouts = repository.get_blackouts(PROVIDER, monday()).await.unwrap();
        let existing = repository.get_appointments(PROVIDER, monday()).await.unwrap();
        compute_slots(&request, &schedule, &blackouts, &existing)
    };

    let before = load(repository.clone()).await;
    assert!(before.contains(&t("10:00")));

    let id = repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
        .await
        .unwrap();
    assert!(id > 0);

    let after = load(repository.clone()).await;
    assert!(!after.contains(&t("10:00")));
    assert_eq!(after.len(), before.len() - 1);

    let stored = repository.get_appointment(id).await.unwrap().unwrap();
    assert_eq!(stored.interval, iv("10:00", "10:30"));
    assert_eq!(stored.status, AppointmentStatus::Pending);
    assert!(!stored.reminder_sent);
    assert_eq!(stored.reminder_attempts, 0);
}

#[tokio::test]
async fn test_overlapping_insert_is_rejected() {
    let repository = repository().await;
    repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "11:00")))
        .await
        .unwrap();

    let overlapping = repository
        .insert_appointment(new_appointment(monday(), iv("10:30", "11:30")))
        .await;
    assert!(matches!(overlapping, Err(DbError::SlotNoLongerAvailable(_))));

    // touching is fine
    repository
        .insert_appointment(new_appointment(monday(), iv("11:00", "11:30")))
        .await
        .unwrap();
    assert_eq!(
        repository
            .get_appointments(PROVIDER, monday())
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_insert_into_blackout_is_rejected() {
    let repository = repository().await;
    repository
        .add_blackout(BlackoutWindow::recurring(PROVIDER, iv("12:00", "13:00")))
        .await
        .unwrap();

    let result = repository
        .insert_appointment(new_appointment(monday(), iv("12:30", "13:00")))
        .await;
    assert!(matches!(result, Err(DbError::SlotNoLongerAvailable(_))));
}

#[tokio::test]
async fn test_canceled_appointment_frees_slot() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("14:00", "14:30")))
        .await
        .unwrap();

    assert!(repository
        .update_status(id, AppointmentStatus::Canceled)
        .await
        .unwrap());
    assert!(!repository
        .update_status(9999, AppointmentStatus::Canceled)
        .await
        .unwrap());

    repository
        .insert_appointment(new_appointment(monday(), iv("14:00", "14:30")))
        .await
        .expect("canceled appointment no longer blocks");
}

#[tokio::test]
async fn test_reinstating_status_rechecks_the_slot() {
    let repository = repository().await;
    let first = repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
        .await
        .unwrap();
    repository
        .update_status(first, AppointmentStatus::Canceled)
        .await
        .unwrap();
    let second = repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
        .await
        .unwrap();

    let result = repository
        .update_status(first, AppointmentStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(DbError::SlotNoLongerAvailable(_))));

    let blocking: Vec<i64> = repository
        .get_appointments(PROVIDER, monday())
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.status.blocks_time())
        .map(|a| a.id)
        .collect();
    assert_eq!(blocking, vec![second]);

    // once the other booking is gone the first one can come back
    repository
        .update_status(second, AppointmentStatus::NoShow)
        .await
        .unwrap();
    assert!(repository
        .update_status(first, AppointmentStatus::Confirmed)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_confirming_a_blocking_appointment_keeps_it() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
        .await
        .unwrap();

    assert!(repository
        .update_status(id, AppointmentStatus::Confirmed)
        .await
        .unwrap());
    assert!(!repository
        .update_status(9999, AppointmentStatus::Confirmed)
        .await
        .unwrap());
    let stored = repository.get_appointment(id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_recurring_blackout_keeps_free_slots_bookable() {
    let repository = repository().await;
    repository
        .add_blackout(BlackoutWindow::recurring(PROVIDER, iv("12:00", "13:00")))
        .await
        .unwrap();

    let blackouts = repository.get_blackouts(PROVIDER, monday()).await.unwrap();
    assert_eq!(blackouts.len(), 1);
    assert_eq!(blackouts[0].date, None);
    repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .expect("slot outside the blackout");
}

#[tokio::test]
async fn test_concurrent_inserts_on_a_file_database_book_once() {
    let database = FileDatabase::new();
    let repository = database.repository().await;

    let mut inserts = JoinSet::new();
    for _ in 0..8 {
        let repository = repository.clone();
        inserts.spawn(async move {
            repository
                .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
                .await
        });
    }

    let mut booked = 0;
    let mut taken = 0;
    while let Some(result) = inserts.join_next().await {
        match result.unwrap() {
            Ok(_) => booked += 1,
            Err(DbError::SlotNoLongerAvailable(_)) => taken += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((booked, taken), (1, 7));
    assert_eq!(
        repository
            .get_appointments(PROVIDER, monday())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_concurrent_claims_on_a_file_database_have_one_winner() {
    let database = FileDatabase::new();
    let repository = database.repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();

    let mut claims = JoinSet::new();
    for _ in 0..8 {
        let repository = repository.clone();
        claims.spawn(async move { repository.mark_reminder_sent(id).await });
    }

    let mut winners = 0;
    while let Some(result) = claims.join_next().await {
        winners += result.unwrap().unwrap();
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_corrupt_attempt_count_is_a_data_error() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();
    repository
        .db_client()
        .execute(&format!(
            "UPDATE appointments SET reminder_attempts = -1 WHERE id = {}",
            id
        ))
        .await
        .unwrap();

    assert!(matches!(
        repository.get_appointment(id).await,
        Err(DbError::DataError(_))
    ));
}

#[tokio::test]
async fn test_claim_reports_one_then_zero() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();

    assert_eq!(repository.mark_reminder_sent(id).await.unwrap(), 1);
    assert_eq!(repository.mark_reminder_sent(id).await.unwrap(), 0);
    assert!(repository.get_appointment(id).await.unwrap().unwrap().reminder_sent);
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();

    let mut claims = JoinSet::new();
    for _ in 0..8 {
        let repository = repository.clone();
        claims.spawn(async move { repository.mark_reminder_sent(id).await });
    }

    let mut winners = 0;
    while let Some(result) = claims.join_next().await {
        winners += result.unwrap().unwrap();
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_reminder_candidates_respect_flags_and_attempts() {
    let repository = repository().await;
    let tuesday = DateKey::from_ymd(2025, 5, 6).unwrap();
    let later = repository
        .insert_appointment(new_appointment(monday(), iv("11:00", "11:30")))
        .await
        .unwrap();
    let earlier = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();
    let claimed = repository
        .insert_appointment(new_appointment(monday(), iv("10:00", "10:30")))
        .await
        .unwrap();
    let canceled = repository
        .insert_appointment(new_appointment(monday(), iv("13:00", "13:30")))
        .await
        .unwrap();
    let exhausted = repository
        .insert_appointment(new_appointment(monday(), iv("14:00", "14:30")))
        .await
        .unwrap();
    let next_day = repository
        .insert_appointment(new_appointment(tuesday, iv("09:00", "09:30")))
        .await
        .unwrap();

    repository.mark_reminder_sent(claimed).await.unwrap();
    repository
        .update_status(canceled, AppointmentStatus::Canceled)
        .await
        .unwrap();
    for _ in 0..3 {
        repository.record_failed_attempt(exhausted).await.unwrap();
    }

    let due: Vec<i64> = repository
        .find_reminder_candidates(monday(), monday(), 3)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(due, vec![earlier, later]);

    let two_days: Vec<i64> = repository
        .find_reminder_candidates(monday(), tuesday, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(two_days, vec![earlier, later, next_day]);
}

#[tokio::test]
async fn test_failed_attempt_is_ignored_once_claimed() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();

    repository.record_failed_attempt(id).await.unwrap();
    repository.mark_reminder_sent(id).await.unwrap();
    repository.record_failed_attempt(id).await.unwrap();

    let stored = repository.get_appointment(id).await.unwrap().unwrap();
    assert_eq!(stored.reminder_attempts, 1);
}

#[tokio::test]
async fn test_reminder_records_are_appended() {
    let repository = repository().await;
    let id = repository
        .insert_appointment(new_appointment(monday(), iv("09:00", "09:30")))
        .await
        .unwrap();
    let sent_at = Utc.with_ymd_and_hms(2025, 5, 5, 5, 0, 0).unwrap();

    let failed = ReminderRecord {
        id: None,
        appointment_id: id,
        channel: ReminderChannel::Sms,
        destination: "+41791234567".to_string(),
        rendered_message: "Hello Max".to_string(),
        sent_at,
        delivery_status: DeliveryStatus::Failed,
        error: Some("timeout".to_string()),
    };
    let sent = ReminderRecord {
        delivery_status: DeliveryStatus::Sent,
        error: None,
        channel: ReminderChannel::Whatsapp,
        ..failed.clone()
    };
    let first = repository.append_reminder_record(failed.clone()).await.unwrap();
    let second = repository.append_reminder_record(sent.clone()).await.unwrap();
    assert!(second > first);

    let records = repository.reminder_records(id).await.unwrap();
    assert_eq!(
        records,
        vec![
            ReminderRecord {
                id: Some(first),
                ..failed
            },
            ReminderRecord {
                id: Some(second),
                ..sent
            },
        ]
    );
}
