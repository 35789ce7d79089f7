//! Sends reminders and claims them.
//!
//! The message goes out first, then the appointment is claimed with a single
//! conditional update. Whoever flips `reminder_sent` owns the reminder; a
//! concurrent dispatcher that finds the flag already set reports
//! [`DispatchOutcome::RaceLost`] and stays quiet.

use crate::error::ReminderError;
use crate::settings::ReminderSettings;
use crate::template::{render_reminder, ReminderContext};
use bookwise_calendar::Appointment;
use bookwise_common::normalize_phone;
use bookwise_common::services::{DeliveryStatus, MessagingService};
use bookwise_db::{BookingRepository, DbError, ReminderRecord};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and claimed by this dispatcher.
    Sent,
    /// Delivered, but another dispatcher claimed the appointment first.
    RaceLost,
    /// Not delivered; the appointment stays eligible until `max_attempts`.
    DeliveryFailed,
}

/// Counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub race_lost: usize,
    pub failed: usize,
    /// Appointments whose dispatch hit a repository error or timeout.
    pub errors: usize,
}

pub struct ReminderDispatcher<R, M: ?Sized> {
    repository: Arc<R>,
    messenger: Arc<M>,
    settings: Arc<ReminderSettings>,
}

impl<R, M> ReminderDispatcher<R, M>
where
    R: BookingRepository + Send + Sync,
    M: MessagingService + ?Sized,
{
    pub fn new(repository: Arc<R>, messenger: Arc<M>, settings: Arc<ReminderSettings>) -> Self {
        Self {
            repository,
            messenger,
            settings,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, ReminderError> {
        let timeout = self.settings.query_timeout;
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| ReminderError::Timeout { operation, timeout })?
            .map_err(ReminderError::from)
    }

    async fn render(&self, appointment: &Appointment) -> Result<String, ReminderError> {
        let provider = self
            .bounded("provider lookup", self.repository.get_provider(appointment.provider_id))
            .await?;
        let provider_name = match &provider {
            Some(p) => p.name.as_str(),
            None => {
                warn!(
                    "Provider {} of appointment {} not found, using business name",
                    appointment.provider_id, appointment.id
                );
                self.settings.business_name.as_str()
            }
        };
        let ctx = ReminderContext {
            customer_name: &appointment.customer_name,
            service: &appointment.service_name,
            provider: provider_name,
            business: &self.settings.business_name,
            date: appointment.date,
            time: appointment.interval.start(),
        };
        Ok(render_reminder(&self.settings.template, &ctx))
    }

    /// Deliver one message, folding transport errors and timeouts into a
    /// failed status.
    async fn deliver(&self, destination: &str, message: &str) -> (DeliveryStatus, Option<String>) {
        let timeout: Duration = self.settings.send_timeout;
        let send = self
            .messenger
            .send(self.settings.channel, destination, message);
        match tokio::time::timeout(timeout, send).await {
            Ok(Ok(receipt)) => (receipt.status, receipt.detail),
            Ok(Err(e)) => (DeliveryStatus::Failed, Some(e.to_string())),
            Err(_) => (
                DeliveryStatus::Failed,
                Some(format!("send timed out after {:?}", timeout)),
            ),
        }
    }

    /// Send, record and claim the reminder of one appointment.
    pub async fn dispatch(&self, appointment: &Appointment) -> Result<DispatchOutcome, ReminderError> {
        let message = self.render(appointment).await?;

        let normalized = normalize_phone(
            &appointment.customer_phone,
            &self.settings.default_country_code,
        );
        let (destination, (status, detail)) = match normalized {
            Some(number) => {
                let delivery = self.deliver(&number, &message).await;
                (number, delivery)
            }
            None => (
                appointment.customer_phone.clone(),
                (
                    DeliveryStatus::Failed,
                    Some("invalid phone number".to_string()),
                ),
            ),
        };

        let record = ReminderRecord {
            id: None,
            appointment_id: appointment.id,
            channel: self.settings.channel,
            destination: destination.clone(),
            rendered_message: message,
            sent_at: Utc::now(),
            delivery_status: status,
            error: detail.clone(),
        };
        // the claim below must still happen after a delivered message, so a lost record is only logged
        if let Err(e) = self
            .bounded("reminder record", self.repository.append_reminder_record(record))
            .await
        {
            error!(
                "Failed to record reminder delivery for appointment {}: {}",
                appointment.id, e
            );
        }

        match status {
            DeliveryStatus::Sent => {
                let claimed = self
                    .bounded("reminder claim", self.repository.mark_reminder_sent(appointment.id))
                    .await?;
                if claimed == 1 {
                    info!(
                        "Reminder for appointment {} sent to {}",
                        appointment.id, destination
                    );
                    Ok(DispatchOutcome::Sent)
                } else {
                    debug!(
                        "Reminder for appointment {} already claimed elsewhere",
                        appointment.id
                    );
                    Ok(DispatchOutcome::RaceLost)
                }
            }
            DeliveryStatus::Failed => {
                warn!(
                    "Reminder for appointment {} to {} failed: {}",
                    appointment.id,
                    destination,
                    detail.as_deref().unwrap_or("unknown error")
                );
                self.bounded(
                    "failed attempt update",
                    self.repository.record_failed_attempt(appointment.id),
                )
                .await?;
                Ok(DispatchOutcome::DeliveryFailed)
            }
        }
    }

    /// Dispatch in the given order; one appointment's failure never stops the rest.
    pub async fn dispatch_batch(&self, appointments: &[Appointment]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for appointment in appointments {
            match self.dispatch(appointment).await {
                Ok(DispatchOutcome::Sent) => summary.sent += 1,
                Ok(DispatchOutcome::RaceLost) => summary.race_lost += 1,
                Ok(DispatchOutcome::DeliveryFailed) => summary.failed += 1,
                Err(e) => {
                    error!("Reminder for appointment {} aborted: {}", appointment.id, e);
                    summary.errors += 1;
                }
            }
        }
        summary
    }
}
