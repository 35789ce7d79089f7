use crate::error::ReminderError;
use bookwise_config::{AppConfig, ReminderChannel};
use chrono_tz::Tz;
use std::time::Duration;

/// Resolved reminder settings, built once from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub timezone: Tz,
    pub business_name: String,
    pub default_country_code: String,
    pub tick_interval: Duration,
    pub lead_time_minutes: i64,
    pub tolerance_minutes: i64,
    pub max_attempts: u32,
    pub batch_limit: usize,
    pub send_timeout: Duration,
    pub query_timeout: Duration,
    pub channel: ReminderChannel,
    pub template: String,
}

impl ReminderSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ReminderError> {
        let reminders = &config.reminders;
        let timezone = config.business.timezone.parse::<Tz>().map_err(|_| {
            ReminderError::Config(format!(
                "unknown time zone '{}'",
                config.business.timezone
            ))
        })?;
        if reminders.tick_interval_secs == 0 {
            return Err(ReminderError::Config(
                "tick_interval_secs must be positive".to_string(),
            ));
        }

        Ok(Self {
            timezone,
            business_name: config.business.name.clone(),
            default_country_code: config.business.default_country_code.clone(),
            tick_interval: Duration::from_secs(reminders.tick_interval_secs),
            lead_time_minutes: reminders.lead_time_minutes,
            tolerance_minutes: reminders.tolerance_minutes,
            max_attempts: reminders.max_attempts,
            batch_limit: reminders.batch_limit,
            send_timeout: Duration::from_secs(reminders.send_timeout_secs),
            query_timeout: Duration::from_secs(reminders.query_timeout_secs),
            channel: reminders.channel,
            template: reminders.template.clone(),
        })
    }

    /// A tolerance narrower than one tick lets appointments slip between two
    /// consecutive windows.
    pub fn tolerance_covers_tick(&self) -> bool {
        self.tolerance_minutes.saturating_mul(60) >= self.tick_interval.as_secs() as i64
    }
}
