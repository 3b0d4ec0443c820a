//! Consecutive-day completion streaks.
//!
//! One [`StreakTracker`] per streak collection (tasks, personal goals). The
//! state of every entity in a collection lives in a single map under the
//! collection's key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

/// Streak counters for one entity.
///
/// `current_streak <= highest_streak` holds for every value produced by
/// [`advance`](Self::advance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current_streak: u32,
    pub highest_streak: u32,
    #[serde(default)]
    pub last_completed_day_key: Option<NaiveDate>,
}

impl StreakState {
    /// State after a completion on `day`.
    ///
    /// Same day is a no-op. A gap of exactly one calendar day extends the
    /// streak; anything else (no history, a longer gap, or a day earlier
    /// than the recorded one) restarts it at 1. The gap is measured between
    /// calendar dates, so DST shifts cannot produce a 23 or 25 hour "day".
    pub fn advance(self, day: NaiveDate) -> Self {
        if self.last_completed_day_key == Some(day) {
            return self;
        }

        let current_streak = match self.last_completed_day_key {
            Some(last) if (day - last).num_days() == 1 => self.current_streak.saturating_add(1),
            _ => 1,
        };

        Self {
            current_streak,
            highest_streak: self.highest_streak.max(current_streak),
            last_completed_day_key: Some(day),
        }
    }

    /// Streak as a user would see it on `today`: the stored count while the
    /// chain is unbroken (completed today or yesterday), otherwise 0.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        match self.last_completed_day_key {
            Some(last) if (0..=1).contains(&(today - last).num_days()) => self.current_streak,
            _ => 0,
        }
    }
}

/// Persistent streak map keyed by entity id.
pub struct StreakTracker {
    key: String,
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
}

impl StreakTracker {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: CollectionLocks,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            store,
            locks,
            clock,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> BTreeMap<String, StreakState> {
        read_json(self.store.as_ref(), &self.key).unwrap_or_default()
    }

    /// Stored state, or the zero state if the entity has none.
    pub fn get_streak(&self, entity_id: &str) -> StreakState {
        self.load().get(entity_id).copied().unwrap_or_default()
    }

    /// Every tracked entity and its state.
    pub fn all(&self) -> BTreeMap<String, StreakState> {
        self.load()
    }

    /// Record a completion today (local time).
    pub fn record_completion(&self, entity_id: &str) -> Result<StreakState> {
        self.record_completion_on(entity_id, self.clock.today())
    }

    /// Record a completion on an explicit local day.
    ///
    /// Days earlier than the last recorded one are not reordered; they take
    /// the restart path of [`StreakState::advance`].
    pub fn record_completion_on(&self, entity_id: &str, day: NaiveDate) -> Result<StreakState> {
        self.locks.with(&self.key, || -> Result<StreakState> {
            let mut streaks = self.load();
            let previous = streaks.get(entity_id).copied().unwrap_or_default();
            let next = previous.advance(day);
            if next == previous {
                return Ok(previous);
            }

            streaks.insert(entity_id.to_string(), next);
            write_json(self.store.as_ref(), &self.key, &streaks)?;
            tracing::debug!(
                collection = %self.key,
                entity_id,
                current = next.current_streak,
                highest = next.highest_streak,
                "streak updated"
            );
            Ok(next)
        })
    }

    /// Forget the entity's streak entirely. Returns whether one existed.
    pub fn reset(&self, entity_id: &str) -> Result<bool> {
        self.locks.with(&self.key, || -> Result<bool> {
            let mut streaks = self.load();
            if streaks.remove(entity_id).is_none() {
                return Ok(false);
            }
            write_json(self.store.as_ref(), &self.key, &streaks)?;
            Ok(true)
        })
    }
}
