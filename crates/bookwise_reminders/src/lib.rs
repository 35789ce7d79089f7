//! Reminder dispatch for upcoming appointments.
//!
//! [`ReminderScheduler`] ticks on a fixed interval, asks the
//! [`ReminderSelector`] for appointments whose start lies inside the lead-time
//! window and hands them to the [`ReminderDispatcher`], which sends, records
//! and claims each reminder.

pub mod dispatcher;
pub mod error;
pub mod scheduler;
pub mod selector;
pub mod settings;
pub mod template;
#[cfg(test)]
mod test_support;

pub use dispatcher::{DispatchOutcome, DispatchSummary, ReminderDispatcher};
pub use error::ReminderError;
pub use scheduler::{ReminderScheduler, TickOutcome};
pub use selector::{is_due, is_retry_due, local_to_utc, ReminderSelector, ReminderWindow};
pub use settings::ReminderSettings;
pub use template::{render_reminder, ReminderContext};
