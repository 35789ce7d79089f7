// --- File: crates/bookwise_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! The reminder dispatcher only knows these traits, so tests and alternative
//! providers can be plugged in without touching the dispatch logic.

use bookwise_config::ReminderChannel;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// What the messaging provider reported for an accepted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider-side message id, if one was returned.
    pub provider_id: Option<String>,
    pub status: DeliveryStatus,
    /// Provider error text when `status` is `Failed`.
    pub detail: Option<String>,
}

impl DeliveryReceipt {
    pub fn sent(provider_id: Option<String>) -> Self {
        Self {
            provider_id,
            status: DeliveryStatus::Sent,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            provider_id: None,
            status: DeliveryStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// A trait for outbound messaging.
///
/// Implementations deliver one message and report the result. They must not
/// retry internally; the reminder scheduler decides about retries.
pub trait MessagingService: Send + Sync {
    /// Error type for transport failures (network, configuration).
    type Error: StdError + Send + Sync + 'static;

    /// Send `message` to `destination` (E.164 phone number) over `channel`.
    fn send(
        &self,
        channel: ReminderChannel,
        destination: &str,
        message: &str,
    ) -> BoxFuture<'_, DeliveryReceipt, Self::Error>;
}

/// Adapter erasing the concrete error type so services can be stored as
/// `Arc<dyn MessagingService<Error = BoxedError>>`.
pub struct BoxedMessagingService<S>(pub S);

impl<S> MessagingService for BoxedMessagingService<S>
where
    S: MessagingService,
{
    type Error = BoxedError;

    fn send(
        &self,
        channel: ReminderChannel,
        destination: &str,
        message: &str,
    ) -> BoxFuture<'_, DeliveryReceipt, Self::Error> {
        let fut = self.0.send(channel, destination, message);
        Box::pin(async move { fut.await.map_err(|e| BoxedError(Box::new(e))) })
    }
}
