//! User-defined personal goals.
//!
//! Goal definitions and goal completions live under separate keys. Removing
//! a goal leaves its completion history and streak in place.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::CompletionTracker;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

pub const GOALS_KEY: &str = "personal_goals";
pub const GOAL_COMPLETIONS_KEY: &str = "personal_goal_completions";
pub const GOAL_STREAKS_KEY: &str = "personal_goals_streaks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalGoal {
    pub id: String,
    pub title: String,
    pub xp: u32,
    pub created_at: DateTime<FixedOffset>,
}

/// Payload of a goal completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalCompletion {
    pub xp_awarded: u32,
}

pub type GoalTracker = CompletionTracker<GoalCompletion>;

/// Goal definitions, oldest first.
pub struct GoalBook {
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
}

impl GoalBook {
    pub fn new(store: Arc<dyn KvStore>, locks: CollectionLocks, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            locks,
            clock,
        }
    }

    pub fn list(&self) -> Vec<PersonalGoal> {
        read_json(self.store.as_ref(), GOALS_KEY).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<PersonalGoal> {
        self.list().into_iter().find(|g| g.id == id)
    }

    pub fn add(&self, title: &str, xp: u32) -> Result<PersonalGoal> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()).into());
        }
        let goal = PersonalGoal {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            xp,
            created_at: self.clock.now(),
        };
        self.locks.with(GOALS_KEY, || -> Result<()> {
            let mut goals = self.list();
            goals.push(goal.clone());
            write_json(self.store.as_ref(), GOALS_KEY, &goals)?;
            Ok(())
        })?;
        Ok(goal)
    }

    /// Remove a goal definition. Returns whether it existed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.locks.with(GOALS_KEY, || -> Result<bool> {
            let mut goals = self.list();
            let before = goals.len();
            goals.retain(|g| g.id != id);
            if goals.len() == before {
                return Ok(false);
            }
            write_json(self.store.as_ref(), GOALS_KEY, &goals)?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    fn book() -> GoalBook {
        GoalBook::new(
            Arc::new(MemoryStore::new()),
            CollectionLocks::new(),
            Arc::new(FixedClock::at("2024-03-04T08:00:00+00:00")),
        )
    }

    #[test]
    fn add_list_remove() {
        let goals = book();
        let a = goals.add("Learn guitar", 12).unwrap();
        let b = goals.add("  Sleep by 11  ", 10).unwrap();
        assert_eq!(b.title, "Sleep by 11");
        assert_ne!(a.id, b.id);
        assert_eq!(goals.list().len(), 2);
        assert_eq!(goals.get(&a.id), Some(a.clone()));

        assert!(goals.remove(&a.id).unwrap());
        assert!(!goals.remove(&a.id).unwrap());
        assert_eq!(goals.list(), vec![b]);
    }

    #[test]
    fn rejects_blank_title() {
        assert!(book().add("   ", 5).is_err());
    }
}
