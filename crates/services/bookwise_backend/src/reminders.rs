// --- File: crates/services/bookwise_backend/src/reminders.rs ---
use crate::StartupError;
use bookwise_common::{BoxedError, BoxedMessagingService, MessagingService};
use bookwise_config::AppConfig;
use bookwise_db::SqlBookingRepository;
use bookwise_reminders::{ReminderScheduler, ReminderSettings};
use bookwise_twilio::TwilioMessagingService;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub type DynMessenger = dyn MessagingService<Error = BoxedError>;

/// Whether this process should run the reminder scheduler.
pub fn reminders_enabled(config: &AppConfig) -> bool {
    if !config.reminders.enabled {
        info!("Reminders disabled by configuration");
        return false;
    }
    if !config.use_twilio {
        warn!("Reminders are enabled but use_twilio is false; no reminders will be sent");
        return false;
    }
    true
}

/// Starts the reminder scheduler in the background when enabled. The returned
/// task ends once `shutdown` turns true.
pub fn spawn_reminder_scheduler(
    config: &AppConfig,
    repository: Arc<SqlBookingRepository>,
    shutdown: watch::Receiver<bool>,
) -> Result<Option<JoinHandle<()>>, StartupError> {
    if !reminders_enabled(config) {
        return Ok(None);
    }
    let settings = ReminderSettings::from_config(config)?;
    let twilio = TwilioMessagingService::from_app_config(config)?;
    let messenger: Arc<DynMessenger> = Arc::new(BoxedMessagingService(twilio));

    let scheduler = Arc::new(ReminderScheduler::new(repository, messenger, settings));
    Ok(Some(tokio::spawn(scheduler.run(shutdown))))
}
