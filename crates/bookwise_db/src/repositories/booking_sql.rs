//! SQL implementation of the booking repository
//!
//! Dates are stored as `YYYY-MM-DD` text, times of day as integer minutes
//! since midnight and flags as integers, because the `Any` driver decodes
//! neither chrono types nor booleans portably. It cannot decode NULL either,
//! so nullable text columns are read through `COALESCE(col, '')`.
//!
//! Every write that can occupy a slot first bumps the `slot_locks` row of the
//! provider and date. On SQLite that takes the database write lock before
//! anything is read; on PostgreSQL it serializes writers of the same day.

use crate::error::DbError;
use crate::repositories::booking::{BookingRepository, Provider, ReminderRecord};
use crate::DbClient;
use bookwise_calendar::{
    find_conflict, Appointment, AppointmentStatus, BlackoutWindow, DateKey, DayHours, Interval,
    NewAppointment, WeeklySchedule,
};
use bookwise_common::DeliveryStatus;
use bookwise_config::ReminderChannel;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{Executor, Row};
use tracing::{debug, error, info, warn};

const SCHEMA: [&str; 8] = [
    r#"
    CREATE TABLE IF NOT EXISTS providers (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weekly_hours (
        provider_id INTEGER NOT NULL,
        weekday INTEGER NOT NULL,
        start_minute INTEGER NOT NULL,
        end_minute INTEGER NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (provider_id, weekday)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blackouts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider_id INTEGER NOT NULL,
        date TEXT,
        start_minute INTEGER NOT NULL,
        end_minute INTEGER NOT NULL,
        recurring INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider_id INTEGER NOT NULL,
        customer_name TEXT NOT NULL,
        customer_phone TEXT NOT NULL,
        service_name TEXT NOT NULL,
        date TEXT NOT NULL,
        start_minute INTEGER NOT NULL,
        end_minute INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        reminder_sent INTEGER NOT NULL DEFAULT 0,
        reminder_attempts INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_appointments_provider_date ON appointments (provider_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_reminder ON appointments (reminder_sent, date)",
    r#"
    CREATE TABLE IF NOT EXISTS reminder_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        appointment_id INTEGER NOT NULL,
        channel TEXT NOT NULL,
        destination TEXT NOT NULL,
        rendered_message TEXT NOT NULL,
        sent_at TEXT NOT NULL,
        delivery_status TEXT NOT NULL,
        error TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS slot_locks (
        provider_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (provider_id, date)
    )
    "#,
];

const APPOINTMENT_COLUMNS: &str = "id, provider_id, customer_name, customer_phone, service_name, \
     date, start_minute, end_minute, status, reminder_sent, reminder_attempts";

/// SQL implementation of the booking repository
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub fn db_client(&self) -> &DbClient {
        &self.db_client
    }
}

// --- row mapping ---

fn minutes(row: &AnyRow, column: &str) -> Result<u16, DbError> {
    let raw: i64 = row.try_get(column)?;
    u16::try_from(raw).map_err(|_| DbError::DataError(format!("{} out of range: {}", column, raw)))
}

fn interval_from_row(row: &AnyRow) -> Result<Interval, DbError> {
    Interval::from_minutes(minutes(row, "start_minute")?, minutes(row, "end_minute")?)
        .map_err(|e| DbError::DataError(e.to_string()))
}

fn date_from_str(raw: &str) -> Result<DateKey, DbError> {
    raw.parse::<DateKey>()
        .map_err(|e| DbError::DataError(e.to_string()))
}

/// Empty text from a `COALESCE`d nullable column means NULL.
fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    let raw: String = row.try_get(column)?;
    Ok(Some(raw).filter(|value| !value.is_empty()))
}

fn flag(row: &AnyRow, column: &str) -> Result<bool, DbError> {
    let raw: i64 = row.try_get(column)?;
    Ok(raw != 0)
}

fn appointment_from_row(row: &AnyRow) -> Result<Appointment, DbError> {
    let date: String = row.try_get("date")?;
    let status: String = row.try_get("status")?;
    let attempts: i64 = row.try_get("reminder_attempts")?;
    let reminder_attempts = u32::try_from(attempts).map_err(|_| {
        DbError::DataError(format!("reminder_attempts out of range: {}", attempts))
    })?;
    Ok(Appointment {
        id: row.try_get("id")?,
        provider_id: row.try_get("provider_id")?,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        service_name: row.try_get("service_name")?,
        date: date_from_str(&date)?,
        interval: interval_from_row(row)?,
        status: status
            .parse::<AppointmentStatus>()
            .map_err(|e| DbError::DataError(e.to_string()))?,
        reminder_sent: flag(row, "reminder_sent")?,
        reminder_attempts,
    })
}

fn blackout_from_row(row: &AnyRow) -> Result<BlackoutWindow, DbError> {
    let date = optional_text(row, "date")?;
    Ok(BlackoutWindow {
        id: Some(row.try_get("id")?),
        provider_id: row.try_get("provider_id")?,
        date: date.as_deref().map(date_from_str).transpose()?,
        interval: interval_from_row(row)?,
        recurring: flag(row, "recurring")?,
    })
}

fn channel_from_str(raw: &str) -> Result<ReminderChannel, DbError> {
    match raw {
        "sms" => Ok(ReminderChannel::Sms),
        "whatsapp" => Ok(ReminderChannel::Whatsapp),
        other => Err(DbError::DataError(format!("unknown channel: {}", other))),
    }
}

fn delivery_status_from_str(raw: &str) -> Result<DeliveryStatus, DbError> {
    match raw {
        "sent" => Ok(DeliveryStatus::Sent),
        "failed" => Ok(DeliveryStatus::Failed),
        other => Err(DbError::DataError(format!("unknown delivery status: {}", other))),
    }
}

fn reminder_record_from_row(row: &AnyRow) -> Result<ReminderRecord, DbError> {
    let channel: String = row.try_get("channel")?;
    let sent_at: String = row.try_get("sent_at")?;
    let delivery_status: String = row.try_get("delivery_status")?;
    Ok(ReminderRecord {
        id: Some(row.try_get("id")?),
        appointment_id: row.try_get("appointment_id")?,
        channel: channel_from_str(&channel)?,
        destination: row.try_get("destination")?,
        rendered_message: row.try_get("rendered_message")?,
        sent_at: DateTime::parse_from_rfc3339(&sent_at)
            .map_err(|e| DbError::DataError(e.to_string()))?
            .with_timezone(&Utc),
        delivery_status: delivery_status_from_str(&delivery_status)?,
        error: optional_text(row, "error")?,
    })
}

/// SQLite busy/locked, PostgreSQL serialization failure or deadlock.
fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(
                db.code().as_deref(),
                Some("5" | "6" | "261" | "517" | "40001" | "40P01")
            ) || db.message().contains("database is locked")
        }
        _ => false,
    }
}

/// Maps a failed write inside a booking transaction. Losing a lock race to
/// another booker is reported like a taken slot.
fn booking_write_error(operation: &str, err: sqlx::Error) -> DbError {
    if is_lock_contention(&err) {
        warn!("{} lost a lock race: {}", operation, err);
        DbError::SlotNoLongerAvailable(format!("{} contended: {}", operation, err))
    } else {
        error!("{} failed: {}", operation, err);
        DbError::QueryError(err.to_string())
    }
}

// --- queries shared by the pool and the booking transaction ---

/// Serializes slot-occupying writes for one provider and date. Must be the
/// first statement of the transaction.
async fn lock_booking_day<'c, E>(
    executor: E,
    provider_id: i64,
    date: DateKey,
) -> Result<(), DbError>
where
    E: Executor<'c, Database = sqlx::Any>,
{
    let query = r#"
        INSERT INTO slot_locks (provider_id, date, version) VALUES ($1, $2, 1)
        ON CONFLICT (provider_id, date) DO UPDATE SET version = slot_locks.version + 1
    "#;
    sqlx::query(query)
        .bind(provider_id)
        .bind(date.to_string())
        .execute(executor)
        .await
        .map_err(|e| booking_write_error("Locking the booking day", e))?;
    Ok(())
}

async fn fetch_blackouts<'c, E>(
    executor: E,
    provider_id: i64,
    date: DateKey,
) -> Result<Vec<BlackoutWindow>, DbError>
where
    E: Executor<'c, Database = sqlx::Any>,
{
    let query = r#"
        SELECT id, provider_id, COALESCE(date, '') AS date, start_minute, end_minute, recurring
        FROM blackouts
        WHERE provider_id = $1 AND (recurring = 1 OR date = $2)
        ORDER BY start_minute, end_minute
    "#;
    let rows = sqlx::query(query)
        .bind(provider_id)
        .bind(date.to_string())
        .fetch_all(executor)
        .await
        .map_err(|e| {
            error!("Failed to load blackouts: {}", e);
            DbError::QueryError(e.to_string())
        })?;
    rows.iter().map(blackout_from_row).collect()
}

async fn fetch_appointments<'c, E>(
    executor: E,
    provider_id: i64,
    date: DateKey,
) -> Result<Vec<Appointment>, DbError>
where
    E: Executor<'c, Database = sqlx::Any>,
{
    let query = format!(
        "SELECT {} FROM appointments WHERE provider_id = $1 AND date = $2 \
         ORDER BY start_minute, id",
        APPOINTMENT_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(provider_id)
        .bind(date.to_string())
        .fetch_all(executor)
        .await
        .map_err(|e| {
            error!("Failed to load appointments: {}", e);
            DbError::QueryError(e.to_string())
        })?;
    rows.iter().map(appointment_from_row).collect()
}

impl BookingRepository for SqlBookingRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");
        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }
        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn get_provider(&self, id: i64) -> Result<Option<Provider>, DbError> {
        let row = sqlx::query("SELECT id, name FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load provider {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        match row {
            Some(row) => Ok(Some(Provider {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_provider(&self, provider: Provider) -> Result<(), DbError> {
        debug!("Upserting provider {}", provider.id);
        let query = r#"
            INSERT INTO providers (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name
        "#;
        sqlx::query(query)
            .bind(provider.id)
            .bind(&provider.name)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert provider: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(())
    }

    async fn get_weekly_schedule(&self, provider_id: i64) -> Result<WeeklySchedule, DbError> {
        let query = r#"
            SELECT weekday, start_minute, end_minute, active
            FROM weekly_hours
            WHERE provider_id = $1
            ORDER BY weekday
        "#;
        let rows = sqlx::query(query)
            .bind(provider_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load opening hours: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let mut schedule = WeeklySchedule::new();
        for row in &rows {
            let weekday: i64 = row.try_get("weekday")?;
            let weekday = u8::try_from(weekday)
                .map_err(|_| DbError::DataError(format!("weekday out of range: {}", weekday)))?;
            let hours = DayHours {
                open: interval_from_row(row)?,
                active: flag(row, "active")?,
            };
            schedule
                .set_day(weekday, Some(hours))
                .map_err(|e| DbError::DataError(e.to_string()))?;
        }
        Ok(schedule)
    }

    async fn set_weekly_schedule(
        &self,
        provider_id: i64,
        schedule: WeeklySchedule,
    ) -> Result<(), DbError> {
        debug!("Replacing opening hours of provider {}", provider_id);
        let mut tx = self.db_client.begin().await?;

        sqlx::query("DELETE FROM weekly_hours WHERE provider_id = $1")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        let insert = r#"
            INSERT INTO weekly_hours (provider_id, weekday, start_minute, end_minute, active)
            VALUES ($1, $2, $3, $4, $5)
        "#;
        for (weekday, hours) in schedule.days() {
            sqlx::query(insert)
                .bind(provider_id)
                .bind(i64::from(weekday))
                .bind(i64::from(hours.open.start().minutes()))
                .bind(i64::from(hours.open.end().minutes()))
                .bind(i64::from(hours.active))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        info!("Opening hours of provider {} updated", provider_id);
        Ok(())
    }

    async fn get_blackouts(
        &self,
        provider_id: i64,
        date: DateKey,
    ) -> Result<Vec<BlackoutWindow>, DbError> {
        fetch_blackouts(self.db_client.pool(), provider_id, date).await
    }

    async fn add_blackout(&self, blackout: BlackoutWindow) -> Result<i64, DbError> {
        if !blackout.recurring && blackout.date.is_none() {
            return Err(DbError::DataError(
                "a non-recurring blackout needs a date".to_string(),
            ));
        }
        let query = r#"
            INSERT INTO blackouts (provider_id, date, start_minute, end_minute, recurring)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#;
        let date = if blackout.recurring {
            None
        } else {
            blackout.date.map(|d| d.to_string())
        };
        let row = sqlx::query(query)
            .bind(blackout.provider_id)
            .bind(date)
            .bind(i64::from(blackout.interval.start().minutes()))
            .bind(i64::from(blackout.interval.end().minutes()))
            .bind(i64::from(blackout.recurring))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert blackout: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let id: i64 = row.try_get("id")?;
        info!(
            "Blackout {} added for provider {} ({})",
            id, blackout.provider_id, blackout.interval
        );
        Ok(id)
    }

    async fn delete_blackout(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM blackouts WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete blackout {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_appointments(
        &self,
        provider_id: i64,
        date: DateKey,
    ) -> Result<Vec<Appointment>, DbError> {
        fetch_appointments(self.db_client.pool(), provider_id, date).await
    }

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, DbError> {
        let query = format!("SELECT {} FROM appointments WHERE id = $1", APPOINTMENT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load appointment {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;
        row.as_ref().map(appointment_from_row).transpose()
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<i64, DbError> {
        debug!(
            "Booking provider {} on {} at {}",
            appointment.provider_id, appointment.date, appointment.interval
        );
        let mut tx = self.db_client.begin().await?;
        lock_booking_day(&mut *tx, appointment.provider_id, appointment.date).await?;

        // Re-read the latest state inside the transaction and re-run the overlap check
        let blackouts = fetch_blackouts(&mut *tx, appointment.provider_id, appointment.date).await?;
        let existing =
            fetch_appointments(&mut *tx, appointment.provider_id, appointment.date).await?;
        if let Some(conflict) = find_conflict(
            appointment.provider_id,
            appointment.date,
            &appointment.interval,
            &blackouts,
            &existing,
        ) {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            warn!(
                "Slot {} on {} for provider {} is taken: {:?}",
                appointment.interval, appointment.date, appointment.provider_id, conflict
            );
            return Err(DbError::SlotNoLongerAvailable(format!(
                "{} on {} overlaps {:?}",
                appointment.interval, appointment.date, conflict
            )));
        }

        // The insert carries the same overlap conditions, so a writer that slipped in
        // between the read and the write still cannot produce a double booking
        let query = r#"
            INSERT INTO appointments (
                provider_id, customer_name, customer_phone, service_name,
                date, start_minute, end_minute, status, reminder_sent, reminder_attempts
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, 0, 0
            WHERE NOT EXISTS (
                SELECT 1 FROM appointments
                WHERE provider_id = $1 AND date = $5
                  AND status NOT IN ('canceled', 'no_show')
                  AND start_minute < $7 AND $6 < end_minute
            )
            AND NOT EXISTS (
                SELECT 1 FROM blackouts
                WHERE provider_id = $1 AND (recurring = 1 OR date = $5)
                  AND start_minute < $7 AND $6 < end_minute
            )
            RETURNING id
        "#;
        let row = sqlx::query(query)
            .bind(appointment.provider_id)
            .bind(&appointment.customer_name)
            .bind(&appointment.customer_phone)
            .bind(&appointment.service_name)
            .bind(appointment.date.to_string())
            .bind(i64::from(appointment.interval.start().minutes()))
            .bind(i64::from(appointment.interval.end().minutes()))
            .bind(appointment.status.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| booking_write_error("Inserting the appointment", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            warn!(
                "Guarded insert for provider {} on {} at {} matched no row",
                appointment.provider_id, appointment.date, appointment.interval
            );
            return Err(DbError::SlotNoLongerAvailable(format!(
                "{} on {}",
                appointment.interval, appointment.date
            )));
        };
        let id: i64 = row.try_get("id")?;

        tx.commit()
            .await
            .map_err(|e| booking_write_error("Committing the booking", e))?;
        info!(
            "Appointment {} booked for provider {} on {} at {}",
            id, appointment.provider_id, appointment.date, appointment.interval
        );
        Ok(id)
    }

    async fn update_status(&self, id: i64, status: AppointmentStatus) -> Result<bool, DbError> {
        // provider and date never change, so they can be read before locking
        let Some(current) = self.get_appointment(id).await? else {
            return Ok(false);
        };
        if !status.blocks_time() {
            let result = sqlx::query("UPDATE appointments SET status = $1 WHERE id = $2")
                .bind(status.as_str())
                .bind(id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to update status of appointment {}: {}", id, e);
                    DbError::QueryError(e.to_string())
                })?;
            let updated = result.rows_affected() > 0;
            if updated {
                info!("Appointment {} is now {}", id, status);
            }
            return Ok(updated);
        }

        // A time-blocking status may only be set while the slot is still free
        let mut tx = self.db_client.begin().await?;
        lock_booking_day(&mut *tx, current.provider_id, current.date).await?;

        let blackouts = fetch_blackouts(&mut *tx, current.provider_id, current.date).await?;
        let others: Vec<Appointment> =
            fetch_appointments(&mut *tx, current.provider_id, current.date)
                .await?
                .into_iter()
                .filter(|a| a.id != id)
                .collect();
        if let Some(conflict) = find_conflict(
            current.provider_id,
            current.date,
            &current.interval,
            &blackouts,
            &others,
        ) {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            warn!(
                "Appointment {} cannot become {}: {} on {} overlaps {:?}",
                id, status, current.interval, current.date, conflict
            );
            return Err(DbError::SlotNoLongerAvailable(format!(
                "{} on {} overlaps {:?}",
                current.interval, current.date, conflict
            )));
        }

        let result = sqlx::query("UPDATE appointments SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| booking_write_error("Updating the appointment status", e))?;
        tx.commit()
            .await
            .map_err(|e| booking_write_error("Committing the status update", e))?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("Appointment {} is now {}", id, status);
        }
        Ok(updated)
    }

    async fn find_reminder_candidates(
        &self,
        from_date: DateKey,
        to_date: DateKey,
        max_attempts: u32,
    ) -> Result<Vec<Appointment>, DbError> {
        let query = format!(
            "SELECT {} FROM appointments \
             WHERE status IN ('pending', 'confirmed') \
               AND reminder_sent = 0 \
               AND reminder_attempts < $1 \
               AND date >= $2 AND date <= $3 \
             ORDER BY date, start_minute, id",
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(i64::from(max_attempts))
            .bind(from_date.to_string())
            .bind(to_date.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load reminder candidates: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        rows.iter().map(appointment_from_row).collect()
    }

    async fn mark_reminder_sent(&self, id: i64) -> Result<u64, DbError> {
        let result =
            sqlx::query("UPDATE appointments SET reminder_sent = 1 WHERE id = $1 AND reminder_sent = 0")
                .bind(id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to claim reminder of appointment {}: {}", id, e);
                    DbError::QueryError(e.to_string())
                })?;
        Ok(result.rows_affected())
    }

    async fn record_failed_attempt(&self, id: i64) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE appointments SET reminder_attempts = reminder_attempts + 1 \
             WHERE id = $1 AND reminder_sent = 0",
        )
        .bind(id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to count reminder attempt of appointment {}: {}", id, e);
            DbError::QueryError(e.to_string())
        })?;
        Ok(())
    }

    async fn append_reminder_record(&self, record: ReminderRecord) -> Result<i64, DbError> {
        let query = r#"
            INSERT INTO reminder_records (
                appointment_id, channel, destination, rendered_message,
                sent_at, delivery_status, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#;
        let row = sqlx::query(query)
            .bind(record.appointment_id)
            .bind(record.channel.as_str())
            .bind(&record.destination)
            .bind(&record.rendered_message)
            .bind(record.sent_at.to_rfc3339())
            .bind(record.delivery_status.as_str())
            .bind(record.error.clone())
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to append reminder record: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(row.try_get("id")?)
    }

    async fn reminder_records(&self, appointment_id: i64) -> Result<Vec<ReminderRecord>, DbError> {
        let query = r#"
            SELECT id, appointment_id, channel, destination, rendered_message,
                   sent_at, delivery_status, COALESCE(error, '') AS error
            FROM reminder_records
            WHERE appointment_id = $1
            ORDER BY id
        "#;
        let rows = sqlx::query(query)
            .bind(appointment_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load reminder records: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        rows.iter().map(reminder_record_from_row).collect()
    }
}
