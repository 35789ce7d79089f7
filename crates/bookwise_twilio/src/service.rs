// --- File: crates/bookwise_twilio/src/service.rs ---
use crate::TwilioError;
use bookwise_common::services::{BoxFuture, DeliveryReceipt, MessagingService};
use bookwise_config::{AppConfig, ReminderChannel, TwilioConfig};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

const SECRET_MARKER: &str = "secret_from_env";

/// The part of Twilio's message resource we care about.
#[derive(Deserialize, Debug)]
struct MessageResource {
    sid: Option<String>,
    status: Option<String>,
    error_message: Option<String>,
}

/// Twilio's error payload.
#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Sends SMS and WhatsApp messages through the Twilio Messages API.
///
/// One HTTP request per message, no retries.
#[derive(Debug, Clone)]
pub struct TwilioMessagingService {
    client: Client,
    config: TwilioConfig,
}

impl TwilioMessagingService {
    pub fn new(config: TwilioConfig, timeout: Duration) -> Result<Self, TwilioError> {
        for (name, value) in [
            ("account_sid", &config.account_sid),
            ("auth_token", &config.auth_token),
            ("phone_number", &config.phone_number),
        ] {
            if value.is_empty() || value == SECRET_MARKER {
                return Err(TwilioError::ConfigError(format!("{} is not set", name)));
            }
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build the service from the `[twilio]` section, using the reminder send
    /// timeout for every request.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, TwilioError> {
        let twilio = config
            .twilio
            .clone()
            .ok_or_else(|| TwilioError::ConfigError("[twilio] section missing".to_string()))?;
        Self::new(
            twilio,
            Duration::from_secs(config.reminders.send_timeout_secs),
        )
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    /// Twilio addresses WhatsApp numbers as `whatsapp:+41...`.
    pub fn address(channel: ReminderChannel, number: &str) -> String {
        match channel {
            ReminderChannel::Sms => number.to_string(),
            ReminderChannel::Whatsapp => format!("whatsapp:{}", number),
        }
    }

    async fn post_message(
        &self,
        to: String,
        from: String,
        body: String,
    ) -> Result<DeliveryReceipt, TwilioError> {
        let params = [
            ("To", to.as_str()),
            ("From", from.as_str()),
            ("Body", body.as_str()),
        ];
        debug!("Posting message to {} via {}", to, self.messages_url());

        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(ApiErrorBody {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{} (code {})", message, code),
                Ok(ApiErrorBody {
                    message: Some(message),
                    ..
                }) => message,
                _ => text,
            };
            error!("Twilio returned {}: {}", status, message);
            return Err(TwilioError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource =
            serde_json::from_str(&text).map_err(|e| TwilioError::ApiError {
                status_code: status.as_u16(),
                message: format!("unreadable response: {}", e),
            })?;

        match resource.status.as_deref() {
            Some("failed") | Some("undelivered") => {
                let detail = resource
                    .error_message
                    .unwrap_or_else(|| "message rejected by Twilio".to_string());
                error!("Twilio rejected message to {}: {}", to, detail);
                Ok(DeliveryReceipt::failed(detail))
            }
            _ => {
                info!("Message accepted by Twilio for {} (sid {:?})", to, resource.sid);
                Ok(DeliveryReceipt::sent(resource.sid))
            }
        }
    }
}

impl MessagingService for TwilioMessagingService {
    type Error = TwilioError;

    fn send(
        &self,
        channel: ReminderChannel,
        destination: &str,
        message: &str,
    ) -> BoxFuture<'_, DeliveryReceipt, Self::Error> {
        // Clone the values to avoid lifetime issues
        let to = Self::address(channel, destination);
        let from = Self::address(channel, &self.config.phone_number);
        let body = message.to_string();

        Box::pin(async move { self.post_message(to, from, body).await })
    }
}
