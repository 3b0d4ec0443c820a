//! Once-a-day completions with streaks.
//!
//! Tasks and personal goals share this flow: a completion event is appended
//! (at most one per entity per local day) and the entity's streak advanced.
//! The two writes go to different collections and are not atomic together.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calendar::CalendarAggregator;
use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::{EventEnvelope, EventStore};
use crate::streak::{StreakState, StreakTracker};

/// A recorded completion and the streak it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion<P> {
    pub event: EventEnvelope<P>,
    pub streak: StreakState,
}

pub struct CompletionTracker<P> {
    events: EventStore<P>,
    streaks: StreakTracker,
    clock: Arc<dyn Clock>,
}

impl<P> CompletionTracker<P>
where
    P: Serialize + DeserializeOwned + Clone,
{
    pub fn new(events: EventStore<P>, streaks: StreakTracker, clock: Arc<dyn Clock>) -> Self {
        Self {
            events,
            streaks,
            clock,
        }
    }

    pub fn events(&self) -> &EventStore<P> {
        &self.events
    }

    pub fn streaks(&self) -> &StreakTracker {
        &self.streaks
    }

    /// Record that `entity_id` was completed now.
    ///
    /// # Errors
    /// `DuplicateCompletion` if it was already completed today; storage
    /// errors if either write fails.
    pub fn complete(&self, entity_id: &str, payload: P) -> Result<Completion<P>> {
        let event = EventEnvelope::now(Some(entity_id.to_string()), self.clock.as_ref(), payload);
        let day = event.day_key;
        self.events.append_unique(event.clone())?;
        let streak = self.streaks.record_completion_on(entity_id, day)?;
        tracing::info!(
            collection = %self.events.key(),
            entity_id,
            streak = streak.current_streak,
            "completion recorded"
        );
        Ok(Completion { event, streak })
    }

    pub fn is_completed_today(&self, entity_id: &str) -> bool {
        self.events.has_entity_on(entity_id, self.clock.today())
    }

    /// Entity ids completed today, most recent first.
    pub fn completed_today(&self) -> Vec<String> {
        self.events
            .on_day(self.clock.today())
            .into_iter()
            .filter_map(|e| e.entity_id)
            .collect()
    }

    pub fn streak(&self, entity_id: &str) -> StreakState {
        self.streaks.get_streak(entity_id)
    }

    pub fn reset_streak(&self, entity_id: &str) -> Result<bool> {
        self.streaks.reset(entity_id)
    }

    /// Completion history, optionally for one entity.
    pub fn completions(&self, entity_id: Option<&str>) -> Vec<EventEnvelope<P>> {
        match entity_id {
            Some(id) => self.events.for_entity(id),
            None => self.events.all(),
        }
    }

    /// Delete one completion event. The streak is not rewound.
    pub fn delete_completion(&self, event_id: &str) -> bool {
        self.events.remove_by_id(event_id)
    }

    pub fn calendar(&self) -> CalendarAggregator<'_, P> {
        CalendarAggregator::new(&self.events)
    }
}
