// --- File: crates/bookwise_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/bookwise.db, loaded via BOOKWISE__DATABASE__URL
}

// --- Business Config ---
/// Settings of the business owning the providers.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BusinessConfig {
    /// Display name used in reminder messages.
    pub name: String,
    /// IANA time zone all dates and opening hours are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Country calling code (digits only) prepended to local phone numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Bookwise".to_string(),
            timezone: default_timezone(),
            default_country_code: default_country_code(),
        }
    }
}

// --- Availability Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AvailabilityConfig {
    /// Slot grid in minutes when the caller does not pass one.
    #[serde(default = "default_step_minutes")]
    pub default_step_minutes: u16,
    /// Upper bound for a requested service duration.
    #[serde(default = "default_max_service_duration")]
    pub max_service_duration_minutes: u16,
    /// Bound on each repository call made while answering a request.
    #[serde(default = "default_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            default_step_minutes: default_step_minutes(),
            max_service_duration_minutes: default_max_service_duration(),
            query_timeout_secs: default_timeout_secs(),
        }
    }
}

// --- Reminder Config ---
/// Channel reminders are delivered through.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    #[default]
    Sms,
    Whatsapp,
}

impl ReminderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Sms => "sms",
            ReminderChannel::Whatsapp => "whatsapp",
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between two scheduler ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Reminder goes out this many minutes before the appointment starts.
    #[serde(default = "default_lead_time")]
    pub lead_time_minutes: i64,
    /// Width of the selection window; should be at least one tick.
    #[serde(default = "default_tolerance")]
    pub tolerance_minutes: i64,
    /// Failed deliveries after which an appointment is no longer retried.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Maximum appointments dispatched per tick.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default)]
    pub channel: ReminderChannel,
    /// Message template, see `bookwise_reminders::template` for placeholders.
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: default_tick_interval(),
            lead_time_minutes: default_lead_time(),
            tolerance_minutes: default_tolerance(),
            max_attempts: default_max_attempts(),
            batch_limit: default_batch_limit(),
            send_timeout_secs: default_timeout_secs(),
            query_timeout_secs: default_timeout_secs(),
            channel: ReminderChannel::default(),
            template: default_template(),
        }
    }
}

// --- Twilio Config ---
// Secrets are usually "secret_from_env" markers resolved from TWILIO_* env vars.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwilioConfig {
    pub account_sid: String, // TWILIO_ACCOUNT_SID
    pub auth_token: String,  // TWILIO_AUTH_TOKEN
    pub phone_number: String, // TWILIO_PHONE_NUMBER, sender in E.164
    #[serde(default = "default_twilio_base_url")]
    pub api_base_url: String,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_twilio: bool,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub business: BusinessConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub twilio: Option<TwilioConfig>,
}

fn default_timezone() -> String {
    "Europe/Zurich".to_string()
}

fn default_country_code() -> String {
    "41".to_string()
}

fn default_step_minutes() -> u16 {
    30
}

fn default_max_service_duration() -> u16 {
    480
}

fn default_true() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    60
}

fn default_lead_time() -> i64 {
    120
}

fn default_tolerance() -> i64 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_batch_limit() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_template() -> String {
    "Hello {customer_name}, this is a reminder of your {service} appointment with {provider} on {date} at {time}.".to_string()
}

fn default_twilio_base_url() -> String {
    "https://api.twilio.com".to_string()
}
