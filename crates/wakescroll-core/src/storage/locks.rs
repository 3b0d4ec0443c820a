//! Per-collection write serialization.
//!
//! Each read-modify-write against a named key runs while holding that key's
//! mutex, so at most one write per collection is in flight. Different keys
//! never contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of one mutex per collection key.
///
/// Clones share the same registry; hand one clone to every store that
/// writes through the same [`KvStore`](super::KvStore).
#[derive(Debug, Clone, Default)]
pub struct CollectionLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(key);
        let _guard: MutexGuard<'_, ()> = match handle.lock() {
            Ok(guard) => guard,
            // The protected data is `()`; a panic mid-write leaves nothing to repair.
            Err(poisoned) => poisoned.into_inner(),
        };
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvStore, MemoryStore};
    use std::thread;

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let locks = CollectionLocks::new();
        store.set("counter", "0").unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let locks = locks.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with("counter", || {
                            let current: u32 =
                                store.get("counter").unwrap().unwrap().parse().unwrap();
                            thread::yield_now();
                            store.set("counter", &(current + 1).to_string()).unwrap();
                        });
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(store.get("counter").unwrap().as_deref(), Some("400"));
    }
}
