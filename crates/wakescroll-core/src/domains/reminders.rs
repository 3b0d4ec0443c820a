//! Custom weekly reminders and their fire log.

use chrono::{DateTime, FixedOffset, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::ledger::{EventEnvelope, EventStore};
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

pub const REMINDERS_KEY: &str = "customReminders";
pub const REMINDER_FIRES_KEY: &str = "custom_reminder_fires";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomReminder {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub weekdays: Vec<Weekday>,
    /// Local wall-clock time of day.
    pub time: NaiveTime,
    pub enabled: bool,
    pub created_at: DateTime<FixedOffset>,
}

/// Payload of a reminder fire event. The event's entity id is the reminder id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFire {
    pub title: String,
}

pub struct ReminderBook {
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
    fires: EventStore<ReminderFire>,
}

impl ReminderBook {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: CollectionLocks,
        clock: Arc<dyn Clock>,
        fires: EventStore<ReminderFire>,
    ) -> Self {
        Self {
            store,
            locks,
            clock,
            fires,
        }
    }

    pub fn list(&self) -> Vec<CustomReminder> {
        read_json(self.store.as_ref(), REMINDERS_KEY).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<CustomReminder> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Create an enabled reminder. Duplicate weekdays are collapsed.
    pub fn add(
        &self,
        title: &str,
        body: &str,
        weekdays: &[Weekday],
        time: NaiveTime,
    ) -> Result<CustomReminder> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()).into());
        }
        let mut days: Vec<Weekday> = Vec::with_capacity(weekdays.len());
        for day in weekdays {
            if !days.contains(day) {
                days.push(*day);
            }
        }
        if days.is_empty() {
            return Err(ValidationError::Empty("weekdays".into()).into());
        }
        days.sort_by_key(|d| d.num_days_from_monday());

        let reminder = CustomReminder {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            weekdays: days,
            time,
            enabled: true,
            created_at: self.clock.now(),
        };
        self.update(|all| {
            all.push(reminder.clone());
            true
        })?;
        Ok(reminder)
    }

    /// Toggle a reminder and return its new state.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<CustomReminder> {
        let mut found = None;
        self.update(|all| match all.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.enabled = enabled;
                found = Some(r.clone());
                true
            }
            None => false,
        })?;
        found.ok_or_else(|| CoreError::NotFound {
            kind: "reminder",
            id: id.to_string(),
        })
    }

    /// Remove a reminder. Its fire history is kept.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.update(|all| {
            let before = all.len();
            all.retain(|r| r.id != id);
            all.len() != before
        })
    }

    /// Log that a reminder's notification was delivered.
    pub fn record_fire(&self, id: &str) -> Result<EventEnvelope<ReminderFire>> {
        let reminder = self.get(id).ok_or_else(|| CoreError::NotFound {
            kind: "reminder",
            id: id.to_string(),
        })?;
        let event = EventEnvelope::now(
            Some(reminder.id),
            self.clock.as_ref(),
            ReminderFire {
                title: reminder.title,
            },
        );
        self.fires.append(event.clone())?;
        Ok(event)
    }

    pub fn fires(&self, reminder_id: Option<&str>) -> Vec<EventEnvelope<ReminderFire>> {
        match reminder_id {
            Some(id) => self.fires.for_entity(id),
            None => self.fires.all(),
        }
    }

    /// Apply `f` under the collection lock; persist only when it reports a change.
    fn update(&self, f: impl FnOnce(&mut Vec<CustomReminder>) -> bool) -> Result<bool> {
        self.locks.with(REMINDERS_KEY, || -> Result<bool> {
            let mut all = self.list();
            if !f(&mut all) {
                return Ok(false);
            }
            write_json(self.store.as_ref(), REMINDERS_KEY, &all)?;
            Ok(true)
        })
    }
}
