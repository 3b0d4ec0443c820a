//! Daily experience-point ledger.
//!
//! A single global list of `{date, xp}` rows, one per local day, most recent
//! first. Awards on the same day accumulate into that day's row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

/// XP earned on one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpDay {
    pub date: NaiveDate,
    pub xp: u64,
}

pub struct XpLedger {
    key: String,
    cap: usize,
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
}

impl XpLedger {
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: CollectionLocks,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
        cap: usize,
    ) -> Self {
        Self {
            key: key.into(),
            cap: cap.max(1),
            store,
            locks,
            clock,
        }
    }

    /// Full history, most recent day first.
    pub fn history(&self) -> Vec<XpDay> {
        read_json(self.store.as_ref(), &self.key).unwrap_or_default()
    }

    /// Add `amount` to today's row and return today's new total.
    pub fn add_xp(&self, amount: u64) -> Result<u64> {
        let today = self.clock.today();
        self.locks.with(&self.key, || -> Result<u64> {
            let mut history = self.history();
            history.sort_by(|a, b| b.date.cmp(&a.date));
            let total = match history.iter_mut().find(|row| row.date == today) {
                Some(row) => {
                    row.xp = row.xp.saturating_add(amount);
                    row.xp
                }
                None => {
                    // Evict before inserting so today's row is never the one dropped.
                    history.truncate(self.cap - 1);
                    history.push(XpDay {
                        date: today,
                        xp: amount,
                    });
                    history.sort_by(|a, b| b.date.cmp(&a.date));
                    amount
                }
            };
            history.truncate(self.cap);
            write_json(self.store.as_ref(), &self.key, &history)?;
            tracing::debug!(amount, total, "xp awarded");
            Ok(total)
        })
    }

    pub fn todays_xp(&self) -> u64 {
        self.xp_on(self.clock.today())
    }

    pub fn xp_on(&self, day: NaiveDate) -> u64 {
        self.history()
            .iter()
            .find(|row| row.date == day)
            .map_or(0, |row| row.xp)
    }

    /// Sum of XP for days in `start..=end`.
    pub fn xp_between(&self, start: NaiveDate, end: NaiveDate) -> u64 {
        self.history()
            .iter()
            .filter(|row| row.date >= start && row.date <= end)
            .fold(0u64, |acc, row| acc.saturating_add(row.xp))
    }

    /// Sum over the retained history.
    pub fn total_xp(&self) -> u64 {
        self.history()
            .iter()
            .fold(0u64, |acc, row| acc.saturating_add(row.xp))
    }
}
