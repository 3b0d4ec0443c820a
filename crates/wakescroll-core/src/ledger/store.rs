//! Append-only event collections.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

use super::EventEnvelope;
use crate::error::{CoreError, Result};
use crate::storage::{read_json, write_json, CollectionLocks, KvStore};

/// One domain's events under a single key, most-recent-first, bounded by a
/// retention cap.
pub struct EventStore<P> {
    key: String,
    cap: usize,
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for EventStore<P> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            cap: self.cap,
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P> EventStore<P>
where
    P: Serialize + DeserializeOwned + Clone,
{
    /// `cap` is clamped to at least 1.
    pub fn new(
        store: Arc<dyn KvStore>,
        locks: CollectionLocks,
        key: impl Into<String>,
        cap: usize,
    ) -> Self {
        Self {
            key: key.into(),
            cap: cap.max(1),
            store,
            locks,
            _payload: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Every stored event, most recent first. Missing or unreadable data is
    /// an empty list.
    pub fn all(&self) -> Vec<EventEnvelope<P>> {
        read_json(self.store.as_ref(), &self.key).unwrap_or_default()
    }

    /// Prepend `event`, evicting the oldest entries beyond the cap.
    pub fn append(&self, event: EventEnvelope<P>) -> Result<()> {
        self.locks.with(&self.key, || {
            let mut events = self.all();
            self.insert_and_persist(&mut events, event)
        })
    }

    /// Like [`append`](Self::append), but rejects the event if one for the
    /// same entity already exists on its day. The check and the write happen
    /// under the same collection lock.
    ///
    /// Events without an entity id are never considered duplicates.
    pub fn append_unique(&self, event: EventEnvelope<P>) -> Result<()> {
        self.locks.with(&self.key, || {
            let mut events = self.all();
            if let Some(entity_id) = event.entity_id.as_deref() {
                let exists = events
                    .iter()
                    .any(|e| e.day_key == event.day_key && e.belongs_to(entity_id));
                if exists {
                    return Err(CoreError::DuplicateCompletion {
                        entity_id: entity_id.to_string(),
                        day: event.day_key,
                    });
                }
            }
            self.insert_and_persist(&mut events, event)
        })
    }

    fn insert_and_persist(
        &self,
        events: &mut Vec<EventEnvelope<P>>,
        event: EventEnvelope<P>,
    ) -> Result<()> {
        tracing::debug!(collection = %self.key, id = %event.id, "appending event");
        events.insert(0, event);
        if events.len() > self.cap {
            let evicted = events.len() - self.cap;
            events.truncate(self.cap);
            tracing::debug!(collection = %self.key, evicted, "retention cap reached");
        }
        write_json(self.store.as_ref(), &self.key, events)?;
        Ok(())
    }

    /// Remove the event with `id`. Returns `true` only if an event was
    /// removed and the remainder persisted; failures are logged.
    pub fn remove_by_id(&self, id: &str) -> bool {
        self.locks.with(&self.key, || {
            let mut events = self.all();
            let before = events.len();
            events.retain(|e| e.id != id);
            if events.len() == before {
                return false;
            }
            match write_json(self.store.as_ref(), &self.key, &events) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        collection = %self.key,
                        id,
                        error = %e,
                        "failed to remove event"
                    );
                    false
                }
            }
        })
    }

    /// Events recorded for one entity, most recent first.
    pub fn for_entity(&self, entity_id: &str) -> Vec<EventEnvelope<P>> {
        self.all()
            .into_iter()
            .filter(|e| e.belongs_to(entity_id))
            .collect()
    }

    /// Events whose day key is `day`, most recent first.
    pub fn on_day(&self, day: NaiveDate) -> Vec<EventEnvelope<P>> {
        self.all().into_iter().filter(|e| e.day_key == day).collect()
    }

    pub fn has_entity_on(&self, entity_id: &str, day: NaiveDate) -> bool {
        self.all()
            .iter()
            .any(|e| e.day_key == day && e.belongs_to(entity_id))
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the whole collection.
    pub fn clear(&self) -> Result<()> {
        self.locks.with(&self.key, || -> Result<()> {
            self.store.remove(&self.key)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Duration, FixedOffset};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Mark {
        n: u32,
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn store_with_cap(cap: usize) -> (Arc<MemoryStore>, EventStore<Mark>) {
        let kv = Arc::new(MemoryStore::new());
        let events = EventStore::new(kv.clone(), CollectionLocks::new(), "marks", cap);
        (kv, events)
    }

    #[test]
    fn append_keeps_most_recent_first() {
        let (_, store) = store_with_cap(10);
        let base = at("2024-03-04T08:00:00+00:00");
        for n in 0..3 {
            let ts = base + Duration::minutes(n as i64);
            store.append(EventEnvelope::new(None, ts, Mark { n })).unwrap();
        }
        let ns: Vec<u32> = store.all().iter().map(|e| e.payload.n).collect();
        assert_eq!(ns, vec![2, 1, 0]);
    }

    #[test]
    fn retention_cap_evicts_oldest() {
        let (_, store) = store_with_cap(500);
        let base = at("2024-01-01T08:00:00+00:00");
        for n in 0..510u32 {
            let ts = base + Duration::minutes(n as i64);
            store.append(EventEnvelope::new(None, ts, Mark { n })).unwrap();
        }
        let all = store.all();
        assert_eq!(all.len(), 500);
        assert_eq!(all.first().unwrap().payload.n, 509);
        assert_eq!(all.last().unwrap().payload.n, 10);
    }

    #[test]
    fn append_unique_rejects_same_entity_same_day() {
        let (_, store) = store_with_cap(10);
        let morning = at("2024-03-04T08:00:00+00:00");
        let evening = at("2024-03-04T20:00:00+00:00");
        store
            .append_unique(EventEnvelope::new(Some("walk".into()), morning, Mark { n: 1 }))
            .unwrap();
        let err = store
            .append_unique(EventEnvelope::new(Some("walk".into()), evening, Mark { n: 2 }))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateCompletion { ref entity_id, .. } if entity_id == "walk"
        ));
        assert_eq!(store.len(), 1);

        // Other entities and other days are fine
        store
            .append_unique(EventEnvelope::new(Some("read".into()), evening, Mark { n: 3 }))
            .unwrap();
        store
            .append_unique(EventEnvelope::new(
                Some("walk".into()),
                morning + Duration::days(1),
                Mark { n: 4 },
            ))
            .unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn unscoped_events_are_never_duplicates() {
        let (_, store) = store_with_cap(10);
        let ts = at("2024-03-04T08:00:00+00:00");
        store.append_unique(EventEnvelope::new(None, ts, Mark { n: 1 })).unwrap();
        store.append_unique(EventEnvelope::new(None, ts, Mark { n: 2 })).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_by_id() {
        let (_, store) = store_with_cap(10);
        let ts = at("2024-03-04T08:00:00+00:00");
        let keep = EventEnvelope::new(None, ts, Mark { n: 1 });
        let drop = EventEnvelope::new(None, ts, Mark { n: 2 });
        let drop_id = drop.id.clone();
        store.append(keep.clone()).unwrap();
        store.append(drop).unwrap();

        assert!(store.remove_by_id(&drop_id));
        assert!(!store.remove_by_id(&drop_id));
        assert_eq!(store.all(), vec![keep]);
    }

    #[test]
    fn corrupt_collection_reads_as_empty_and_recovers_on_append() {
        let (kv, store) = store_with_cap(10);
        kv.set("marks", "oops").unwrap();
        assert!(store.all().is_empty());

        let ts = at("2024-03-04T08:00:00+00:00");
        store.append(EventEnvelope::new(None, ts, Mark { n: 7 })).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn filters_by_entity_and_day() {
        let (_, store) = store_with_cap(10);
        let monday = at("2024-03-04T08:00:00+00:00");
        let tuesday = monday + Duration::days(1);
        store.append(EventEnvelope::new(Some("a".into()), monday, Mark { n: 1 })).unwrap();
        store.append(EventEnvelope::new(Some("b".into()), monday, Mark { n: 2 })).unwrap();
        store.append(EventEnvelope::new(Some("a".into()), tuesday, Mark { n: 3 })).unwrap();

        assert_eq!(store.for_entity("a").len(), 2);
        assert_eq!(store.on_day(monday.date_naive()).len(), 2);
        assert!(store.has_entity_on("b", monday.date_naive()));
        assert!(!store.has_entity_on("b", tuesday.date_naive()));
    }

    #[test]
    fn clear_drops_collection() {
        let (kv, store) = store_with_cap(10);
        let ts = at("2024-03-04T08:00:00+00:00");
        store.append(EventEnvelope::new(None, ts, Mark { n: 1 })).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(kv.get("marks").unwrap().is_none());
    }
}
