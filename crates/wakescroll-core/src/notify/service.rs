//! Local notification delivery seam.

use chrono::{DateTime, Duration, FixedOffset, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::NotificationContent;
use crate::clock::Clock;
use crate::error::SchedulingError;
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

/// When a notification fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Once, at an absolute instant.
    At { at: DateTime<FixedOffset> },
    /// Once, this many seconds after scheduling.
    After { seconds: u64 },
    /// Every week on `weekday` at local `hour:minute`.
    Weekly {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
}

/// A request to the delivery platform. `identifier` is chosen by the caller
/// so schedules can be tagged and later cancelled by prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: Trigger,
}

/// A notification the platform still holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: Trigger,
    pub scheduled_at: DateTime<FixedOffset>,
}

impl ScheduledNotification {
    /// Instant of a one-shot trigger; `None` for recurring ones.
    pub fn fire_time(&self) -> Option<DateTime<FixedOffset>> {
        match &self.trigger {
            Trigger::At { at } => Some(*at),
            Trigger::After { seconds } => i64::try_from(*seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|d| self.scheduled_at.checked_add_signed(d)),
            Trigger::Weekly { .. } => None,
        }
    }

    /// One-shot notifications are delivered once their fire time passes.
    pub fn is_delivered(&self, now: DateTime<FixedOffset>) -> bool {
        self.fire_time().is_some_and(|at| at <= now)
    }
}

/// Platform service that shows local notifications.
pub trait NotificationService: Send + Sync {
    fn schedule(&self, request: NotificationRequest) -> Result<String, SchedulingError>;
    fn cancel(&self, identifier: &str) -> Result<(), SchedulingError>;
    /// Notifications that have not fired yet (recurring ones always).
    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, SchedulingError>;
}

/// Notification service that keeps its schedule in the key-value store.
///
/// Stands in for the device platform: one-shot notifications whose fire time
/// has passed count as delivered and are dropped from the schedule.
pub struct StoredNotificationQueue {
    key: String,
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
}

impl StoredNotificationQueue {
    pub const DEFAULT_KEY: &'static str = "scheduled_notifications";

    pub fn new(store: Arc<dyn KvStore>, locks: CollectionLocks, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: Self::DEFAULT_KEY.to_string(),
            store,
            locks,
            clock,
        }
    }

    fn load(&self) -> Vec<ScheduledNotification> {
        read_json(self.store.as_ref(), &self.key).unwrap_or_default()
    }

    fn pending(&self) -> Vec<ScheduledNotification> {
        let now = self.clock.now();
        self.load()
            .into_iter()
            .filter(|n| !n.is_delivered(now))
            .collect()
    }
}

impl NotificationService for StoredNotificationQueue {
    fn schedule(&self, request: NotificationRequest) -> Result<String, SchedulingError> {
        if request.identifier.is_empty() {
            return Err(SchedulingError::Rejected("empty identifier".into()));
        }
        if let Trigger::Weekly { hour, minute, .. } = request.trigger {
            if hour > 23 || minute > 59 {
                return Err(SchedulingError::Rejected(format!(
                    "invalid weekly time {hour:02}:{minute:02}"
                )));
            }
        }

        self.locks.with(&self.key, || -> Result<String, SchedulingError> {
            let mut scheduled = self.pending();
            scheduled.retain(|n| n.identifier != request.identifier);
            let identifier = request.identifier.clone();
            scheduled.push(ScheduledNotification {
                identifier: request.identifier,
                content: request.content,
                trigger: request.trigger,
                scheduled_at: self.clock.now(),
            });
            write_json(self.store.as_ref(), &self.key, &scheduled)?;
            Ok(identifier)
        })
    }

    fn cancel(&self, identifier: &str) -> Result<(), SchedulingError> {
        self.locks.with(&self.key, || -> Result<(), SchedulingError> {
            let mut scheduled = self.pending();
            let before = scheduled.len();
            scheduled.retain(|n| n.identifier != identifier);
            if scheduled.len() == before {
                return Err(SchedulingError::UnknownNotification(identifier.to_string()));
            }
            write_json(self.store.as_ref(), &self.key, &scheduled)?;
            Ok(())
        })
    }

    fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, SchedulingError> {
        Ok(self.pending())
    }
}
