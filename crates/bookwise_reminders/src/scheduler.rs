//! Periodic driver for reminder dispatch.
//!
//! Exactly one tick runs at a time per process; a tick that arrives while the
//! previous one is still running is skipped. Across processes the claim in
//! the dispatcher is what keeps reminders unique.

use crate::dispatcher::{DispatchSummary, ReminderDispatcher};
use crate::error::ReminderError;
use crate::selector::ReminderSelector;
use crate::settings::ReminderSettings;
use bookwise_common::services::MessagingService;
use bookwise_db::BookingRepository;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(DispatchSummary),
    SkippedOverlap,
}

/// Marks a tick as running and clears the mark when dropped, also on panic
/// or cancellation of the tick future.
struct TickGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> TickGuard<'a> {
    fn try_acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| TickGuard { running })
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

pub struct ReminderScheduler<R, M: ?Sized> {
    selector: ReminderSelector<R>,
    dispatcher: ReminderDispatcher<R, M>,
    settings: Arc<ReminderSettings>,
    running: AtomicBool,
}

impl<R, M> ReminderScheduler<R, M>
where
    R: BookingRepository + Send + Sync + 'static,
    M: MessagingService + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, messenger: Arc<M>, settings: ReminderSettings) -> Self {
        let settings = Arc::new(settings);
        Self {
            selector: ReminderSelector::new(Arc::clone(&repository), Arc::clone(&settings)),
            dispatcher: ReminderDispatcher::new(repository, messenger, Arc::clone(&settings)),
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One select-and-dispatch pass at the current time.
    pub async fn tick(&self) -> Result<TickOutcome, ReminderError> {
        self.tick_at(Utc::now()).await
    }

    /// One select-and-dispatch pass as if the clock read `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<TickOutcome, ReminderError> {
        let Some(_guard) = TickGuard::try_acquire(&self.running) else {
            info!("Previous reminder tick still running, skipping this one");
            return Ok(TickOutcome::SkippedOverlap);
        };

        let due = self.selector.select_due(now).await?;
        if due.is_empty() {
            return Ok(TickOutcome::Completed(DispatchSummary::default()));
        }
        let summary = self.dispatcher.dispatch_batch(&due).await;
        info!(
            "Reminder tick done: {} sent, {} already claimed, {} failed, {} errors",
            summary.sent, summary.race_lost, summary.failed, summary.errors
        );
        Ok(TickOutcome::Completed(summary))
    }

    async fn logged_tick(&self) {
        let span = info_span!("reminder_tick", tick_id = %Uuid::new_v4());
        async {
            if let Err(e) = self.tick().await {
                error!("Reminder tick failed: {}", e);
            }
        }
        .instrument(span)
        .await
    }

    /// Tick every `tick_interval` until `shutdown` turns true or its sender is
    /// dropped. Each tick is spawned, so a tick that overruns the interval is
    /// seen (and skipped) by the next one instead of delaying the timer.
    ///
    /// Returns only after the tick running at shutdown has finished, so a
    /// reminder handed to the messenger is also claimed.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        if !self.settings.tolerance_covers_tick() {
            warn!(
                "Reminder tolerance of {} min is shorter than the tick interval of {:?}; \
                 appointments can fall between two windows",
                self.settings.tolerance_minutes, self.settings.tick_interval
            );
        }
        info!(
            "Reminder scheduler started (every {:?}, lead time {} min)",
            self.settings.tick_interval, self.settings.lead_time_minutes
        );

        let mut interval = tokio::time::interval(self.settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = JoinSet::new();

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    let scheduler = Arc::clone(&self);
                    ticks.spawn(async move { scheduler.logged_tick().await });
                }
                Some(finished) = ticks.join_next(), if !ticks.is_empty() => {
                    if let Err(e) = finished {
                        error!("Reminder tick task failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if !ticks.is_empty() {
            info!("Waiting for the running reminder tick to finish");
        }
        while let Some(finished) = ticks.join_next().await {
            if let Err(e) = finished {
                error!("Reminder tick task failed: {}", e);
            }
        }
        info!("Reminder scheduler stopped");
    }
}
