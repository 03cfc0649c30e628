use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{ApplicationId, DecisionSource, Verdict};

/// Kinds of committee notifications fanned out to e-mail and in-app channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventType {
    DecisionApplied,
}

/// Payload handed to the notification function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_type: NotificationEventType,
    pub application_id: ApplicationId,
    pub decision: Verdict,
    pub decision_source: DecisionSource,
    pub notes: Option<String>,
}

impl NotificationEvent {
    pub fn decision_applied(
        application_id: ApplicationId,
        decision: Verdict,
        decision_source: DecisionSource,
        notes: Option<String>,
    ) -> Self {
        Self {
            event_type: NotificationEventType::DecisionApplied,
            application_id,
            decision,
            decision_source,
            notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutboxEntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Delivered,
    DeadLettered,
}

/// Queued notification with its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub event: NotificationEvent,
    pub attempts: u32,
    pub status: OutboxStatus,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

/// Durable queue of notifications awaiting delivery.
pub trait NotificationOutbox: Send + Sync {
    fn enqueue(&self, event: NotificationEvent) -> Result<OutboxEntryId, NotificationError>;
    /// Oldest pending entries first.
    fn pending(&self, limit: usize) -> Result<Vec<OutboxEntry>, NotificationError>;
    fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), NotificationError>;
    /// Count a failed attempt; `dead_letter` stops further retries.
    fn mark_failed(
        &self,
        id: OutboxEntryId,
        error: &str,
        dead_letter: bool,
    ) -> Result<(), NotificationError>;
}

/// Outbound hook that actually informs the committee and the startup.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification outbox unavailable: {0}")]
    Store(String),
    #[error("outbox entry {0:?} not found")]
    UnknownEntry(OutboxEntryId),
}

/// Counters from a single relay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub retried: usize,
    pub dead_lettered: usize,
}

impl DispatchReport {
    pub fn is_idle(&self) -> bool {
        self.delivered == 0 && self.retried == 0 && self.dead_lettered == 0
    }
}

/// Drains the outbox through a dispatcher with bounded retries.
pub struct OutboxRelay<O, D> {
    outbox: Arc<O>,
    dispatcher: Arc<D>,
    max_attempts: u32,
    batch_size: usize,
}

impl<O, D> OutboxRelay<O, D>
where
    O: NotificationOutbox + 'static,
    D: NotificationDispatcher + 'static,
{
    pub fn new(outbox: Arc<O>, dispatcher: Arc<D>, max_attempts: u32, batch_size: usize) -> Self {
        Self {
            outbox,
            dispatcher,
            max_attempts: max_attempts.max(1),
            batch_size: batch_size.max(1),
        }
    }

    /// Attempt delivery of one batch of pending entries.
    pub fn run_once(&self) -> Result<DispatchReport, NotificationError> {
        let mut report = DispatchReport::default();

        for entry in self.outbox.pending(self.batch_size)? {
            match self.dispatcher.dispatch(&entry.event) {
                Ok(()) => {
                    self.outbox.mark_delivered(entry.id)?;
                    report.delivered += 1;
                    debug!(
                        entry = entry.id.0,
                        application = %entry.event.application_id.0,
                        "notification delivered"
                    );
                }
                Err(err) => {
                    let attempts = entry.attempts + 1;
                    let dead_letter = attempts >= self.max_attempts;
                    self.outbox
                        .mark_failed(entry.id, &err.to_string(), dead_letter)?;
                    if dead_letter {
                        report.dead_lettered += 1;
                        warn!(
                            entry = entry.id.0,
                            attempts,
                            error = %err,
                            "notification dead-lettered"
                        );
                    } else {
                        report.retried += 1;
                        debug!(
                            entry = entry.id.0,
                            attempts,
                            error = %err,
                            "notification will be retried"
                        );
                    }
                }
            }
        }

        Ok(report)
    }
}
