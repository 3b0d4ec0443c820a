//! Reflective journaling. Reflections are not tied to an entity and any
//! number may be written per day.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calendar::CalendarAggregator;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::ledger::{EventEnvelope, EventStore};

pub const REFLECTIONS_KEY: &str = "mindful_reflections";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub text: String,
    /// Self-reported mood, 1 (low) to 5 (high).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

pub struct ReflectionJournal {
    events: EventStore<Reflection>,
    clock: Arc<dyn Clock>,
}

impl ReflectionJournal {
    pub fn new(events: EventStore<Reflection>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    pub fn submit(
        &self,
        text: &str,
        mood: Option<u8>,
        prompt: Option<String>,
    ) -> Result<EventEnvelope<Reflection>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty("text".into()).into());
        }
        if let Some(mood) = mood {
            if !(1..=5).contains(&mood) {
                return Err(ValidationError::InvalidValue {
                    field: "mood".into(),
                    message: format!("expected 1-5, got {mood}"),
                }
                .into());
            }
        }

        let event = EventEnvelope::now(
            None,
            self.clock.as_ref(),
            Reflection {
                text: text.to_string(),
                mood,
                prompt,
            },
        );
        self.events.append(event.clone())?;
        Ok(event)
    }

    pub fn todays_reflections(&self) -> Vec<EventEnvelope<Reflection>> {
        self.events.on_day(self.clock.today())
    }

    pub fn reflections(&self) -> Vec<EventEnvelope<Reflection>> {
        self.events.all()
    }

    pub fn delete(&self, id: &str) -> bool {
        self.events.remove_by_id(id)
    }

    pub fn calendar(&self) -> CalendarAggregator<'_, Reflection> {
        CalendarAggregator::new(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{CollectionLocks, MemoryStore};

    fn journal() -> ReflectionJournal {
        let clock = Arc::new(FixedClock::at("2024-03-04T21:00:00+01:00"));
        let events = EventStore::new(
            Arc::new(MemoryStore::new()),
            CollectionLocks::new(),
            REFLECTIONS_KEY,
            100,
        );
        ReflectionJournal::new(events, clock)
    }

    #[test]
    fn validates_text_and_mood() {
        let journal = journal();
        assert!(journal.submit("  ", None, None).is_err());
        assert!(journal.submit("ok", Some(0), None).is_err());
        assert!(journal.submit("ok", Some(6), None).is_err());
        assert!(journal.submit("ok", Some(3), None).is_ok());
        assert_eq!(journal.reflections().len(), 1);
    }

    #[test]
    fn delete_removes_only_that_entry() {
        let journal = journal();
        let first = journal.submit("first", None, None).unwrap();
        journal.submit("second", None, None).unwrap();
        assert!(journal.delete(&first.id));
        let left = journal.reflections();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].payload.text, "second");
    }
}
