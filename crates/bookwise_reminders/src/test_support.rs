//! In-memory collaborators for the reminder tests.

use crate::settings::ReminderSettings;
use bookwise_calendar::{
    Appointment, AppointmentStatus, BlackoutWindow, DateKey, Interval, NewAppointment,
    WeeklySchedule,
};
use bookwise_common::services::{BoxFuture, DeliveryReceipt, MessagingService};
use bookwise_config::ReminderChannel;
use bookwise_db::{BookingRepository, DbError, Provider, ReminderRecord};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const TEMPLATE: &str = "Hello {customer_name}, {service} with {provider} at {business} on {date} at {time}.";

pub fn settings() -> ReminderSettings {
    ReminderSettings {
        timezone: chrono_tz::Europe::Zurich,
        business_name: "Salon Nord".to_string(),
        default_country_code: "41".to_string(),
        tick_interval: Duration::from_secs(60),
        lead_time_minutes: 120,
        tolerance_minutes: 1,
        max_attempts: 3,
        batch_limit: 100,
        send_timeout: Duration::from_secs(10),
        query_timeout: Duration::from_secs(10),
        channel: ReminderChannel::Sms,
        template: TEMPLATE.to_string(),
    }
}

pub fn appointment(id: i64, date: DateKey, start: &str) -> Appointment {
    let start = start.parse().unwrap();
    Appointment {
        id,
        provider_id: 1,
        customer_name: "Max".to_string(),
        customer_phone: "079 123 45 67".to_string(),
        service_name: "Haircut".to_string(),
        date,
        interval: Interval::starting_at(start, 30).unwrap(),
        status: AppointmentStatus::Confirmed,
        reminder_sent: false,
        reminder_attempts: 0,
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub appointments: Mutex<Vec<Appointment>>,
    pub records: Mutex<Vec<ReminderRecord>>,
    pub providers: Mutex<Vec<Provider>>,
    pub fail_claims_for: Mutex<HashSet<i64>>,
    pub fail_queries: Mutex<bool>,
    pub candidate_queries: AtomicUsize,
}

impl FakeRepository {
    pub fn with(appointments: Vec<Appointment>) -> Self {
        let repository = Self::default();
        *repository.appointments.lock().unwrap() = appointments;
        repository.providers.lock().unwrap().push(Provider {
            id: 1,
            name: "Anna".to_string(),
        });
        repository
    }

    pub fn stored(&self, id: i64) -> Appointment {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .unwrap()
    }

    pub fn records(&self) -> Vec<ReminderRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl BookingRepository for FakeRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn get_provider(&self, id: i64) -> Result<Option<Provider>, DbError> {
        Ok(self.providers.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_provider(&self, provider: Provider) -> Result<(), DbError> {
        self.providers.lock().unwrap().push(provider);
        Ok(())
    }

    async fn get_weekly_schedule(&self, _provider_id: i64) -> Result<WeeklySchedule, DbError> {
        Ok(WeeklySchedule::new())
    }

    async fn set_weekly_schedule(
        &self,
        _provider_id: i64,
        _schedule: WeeklySchedule,
    ) -> Result<(), DbError> {
        Ok(())
    }

    async fn get_blackouts(
        &self,
        _provider_id: i64,
        _date: DateKey,
    ) -> Result<Vec<BlackoutWindow>, DbError> {
        Ok(Vec::new())
    }

    async fn add_blackout(&self, _blackout: BlackoutWindow) -> Result<i64, DbError> {
        Ok(1)
    }

    async fn delete_blackout(&self, _id: i64) -> Result<bool, DbError> {
        Ok(false)
    }

    async fn get_appointments(
        &self,
        provider_id: i64,
        date: DateKey,
    ) -> Result<Vec<Appointment>, DbError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.provider_id == provider_id && a.date == date)
            .cloned()
            .collect())
    }

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, DbError> {
        Ok(self.appointments.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn insert_appointment(&self, _appointment: NewAppointment) -> Result<i64, DbError> {
        Err(DbError::QueryError("not supported".to_string()))
    }

    async fn update_status(&self, _id: i64, _status: AppointmentStatus) -> Result<bool, DbError> {
        Ok(false)
    }

    async fn find_reminder_candidates(
        &self,
        from_date: DateKey,
        to_date: DateKey,
        max_attempts: u32,
    ) -> Result<Vec<Appointment>, DbError> {
        self.candidate_queries.fetch_add(1, Ordering::SeqCst);
        if *self.fail_queries.lock().unwrap() {
            return Err(DbError::QueryError("database is gone".to_string()));
        }
        let mut found: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.status.is_reminder_eligible()
                    && !a.reminder_sent
                    && a.reminder_attempts < max_attempts
                    && from_date <= a.date
                    && a.date <= to_date
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.interval.start(), a.id));
        Ok(found)
    }

    async fn mark_reminder_sent(&self, id: i64) -> Result<u64, DbError> {
        if self.fail_claims_for.lock().unwrap().contains(&id) {
            return Err(DbError::QueryError("claim failed".to_string()));
        }
        let mut appointments = self.appointments.lock().unwrap();
        match appointments.iter_mut().find(|a| a.id == id && !a.reminder_sent) {
            Some(a) => {
                a.reminder_sent = true;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn record_failed_attempt(&self, id: i64) -> Result<(), DbError> {
        let mut appointments = self.appointments.lock().unwrap();
        if let Some(a) = appointments.iter_mut().find(|a| a.id == id && !a.reminder_sent) {
            a.reminder_attempts += 1;
        }
        Ok(())
    }

    async fn append_reminder_record(&self, record: ReminderRecord) -> Result<i64, DbError> {
        let mut records = self.records.lock().unwrap();
        records.push(record);
        Ok(records.len() as i64)
    }

    async fn reminder_records(&self, appointment_id: i64) -> Result<Vec<ReminderRecord>, DbError> {
        Ok(self
            .records()
            .into_iter()
            .filter(|r| r.appointment_id == appointment_id)
            .collect())
    }
}

#[derive(Debug)]
pub struct FakeTransportError(pub String);

impl fmt::Display for FakeTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FakeTransportError {}

/// How [`FakeMessenger`] answers.
#[derive(Debug, Clone)]
pub enum Behaviour {
    Accept,
    Reject(String),
    TransportError(String),
    Delay(Duration),
}

pub struct FakeMessenger {
    pub behaviour: Behaviour,
    pub sent: Mutex<Vec<(ReminderChannel, String, String)>>,
}

impl FakeMessenger {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(ReminderChannel, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessagingService for FakeMessenger {
    type Error = FakeTransportError;

    fn send(
        &self,
        channel: ReminderChannel,
        destination: &str,
        message: &str,
    ) -> BoxFuture<'_, DeliveryReceipt, Self::Error> {
        let destination = destination.to_string();
        let message = message.to_string();
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap()
                .push((channel, destination, message));
            match &self.behaviour {
                Behaviour::Accept => Ok(DeliveryReceipt::sent(Some("SM1".to_string()))),
                Behaviour::Reject(detail) => Ok(DeliveryReceipt::failed(detail.clone())),
                Behaviour::TransportError(e) => Err(FakeTransportError(e.clone())),
                Behaviour::Delay(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(DeliveryReceipt::sent(None))
                }
            }
        })
    }
}
