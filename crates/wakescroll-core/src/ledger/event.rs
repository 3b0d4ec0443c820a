//! Event envelope shared by every ledger.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

const ID_SUFFIX_LEN: usize = 9;

/// One immutable ledger record.
///
/// `day_key` is the local calendar date of `timestamp` at the moment the
/// event was created. It is stored rather than recomputed so later changes to
/// the device time zone never move an event to another day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<P> {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub day_key: NaiveDate,
    pub payload: P,
}

impl<P> EventEnvelope<P> {
    /// Build an event stamped at `at`.
    pub fn new(entity_id: Option<String>, at: DateTime<FixedOffset>, payload: P) -> Self {
        Self {
            id: generate_id(at),
            entity_id,
            timestamp: at,
            day_key: at.date_naive(),
            payload,
        }
    }

    /// Build an event stamped with the clock's current time.
    pub fn now(entity_id: Option<String>, clock: &dyn Clock, payload: P) -> Self {
        Self::new(entity_id, clock.now(), payload)
    }

    pub fn belongs_to(&self, entity_id: &str) -> bool {
        self.entity_id.as_deref() == Some(entity_id)
    }

    /// True when `entity` is `None` or matches this event's entity.
    pub fn matches(&self, entity: Option<&str>) -> bool {
        match entity {
            Some(id) => self.belongs_to(id),
            None => true,
        }
    }
}

/// `<millis>-<random suffix>`, unique enough for a single-user ledger.
fn generate_id(at: DateTime<FixedOffset>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}-{}", at.timestamp_millis(), suffix)
}
