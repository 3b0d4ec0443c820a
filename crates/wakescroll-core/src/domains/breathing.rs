//! Breathing exercise sessions. Any number per day.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calendar::CalendarAggregator;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::ledger::{EventEnvelope, EventStore};

pub const BREATHING_SESSIONS_KEY: &str = "mindful_breathing_sessions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathingSession {
    /// Pattern name, e.g. "box" or "4-7-8".
    pub pattern: String,
    pub breath_count: u32,
    pub duration_secs: u32,
}

pub struct BreathingLog {
    events: EventStore<BreathingSession>,
    clock: Arc<dyn Clock>,
}

impl BreathingLog {
    pub fn new(events: EventStore<BreathingSession>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    pub fn log_session(
        &self,
        pattern: &str,
        breath_count: u32,
        duration_secs: u32,
    ) -> Result<EventEnvelope<BreathingSession>> {
        if breath_count == 0 {
            return Err(ValidationError::InvalidValue {
                field: "breath_count".into(),
                message: "a session needs at least one breath".into(),
            }
            .into());
        }
        let event = EventEnvelope::now(
            None,
            self.clock.as_ref(),
            BreathingSession {
                pattern: pattern.to_string(),
                breath_count,
                duration_secs,
            },
        );
        self.events.append(event.clone())?;
        Ok(event)
    }

    pub fn todays_sessions(&self) -> Vec<EventEnvelope<BreathingSession>> {
        self.events.on_day(self.clock.today())
    }

    pub fn sessions(&self) -> Vec<EventEnvelope<BreathingSession>> {
        self.events.all()
    }

    pub fn delete(&self, id: &str) -> bool {
        self.events.remove_by_id(id)
    }

    pub fn calendar(&self) -> CalendarAggregator<'_, BreathingSession> {
        CalendarAggregator::new(&self.events)
    }
}
