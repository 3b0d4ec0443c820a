//! Persistent key-value storage.
//!
//! Every ledger in the core owns exactly one named key in a shared
//! [`KvStore`]. Values are JSON text. Nothing enforces referential integrity
//! across keys; a goal definition and its completions only share an id
//! string.

mod config;
pub mod locks;
pub mod memory;
pub mod sqlite;

pub use config::{
    Config, NotificationsConfig, RetentionConfig, XpConfig, MAX_INTERVAL_MINUTES, MAX_WINDOW_SIZE,
};
pub use locks::CollectionLocks;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::StorageError;

/// String-keyed, string-valued persistent store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value.
///
/// Missing keys, backend failures and malformed JSON all come back as
/// `None`; the latter two are logged. Callers treat that as "no data".
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read collection, treating as empty");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value failed to parse, treating as empty");
            None
        }
    }
}

/// Encode and write a JSON value.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw).inspect_err(|e| {
        tracing::error!(key, error = %e, "failed to persist collection");
    })
}

/// Returns the data directory.
///
/// `WAKESCROLL_DATA_DIR` wins when set. Otherwise `~/.config/wakescroll[-dev]/`
/// based on `WAKESCROLL_ENV`; set `WAKESCROLL_ENV=dev` to use the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("WAKESCROLL_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("WAKESCROLL_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("wakescroll-dev")
            } else {
                base_dir.join("wakescroll")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_json_treats_garbage_as_absent() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let value: Option<Vec<u32>> = read_json(&store, "broken");
        assert!(value.is_none());
    }

    #[test]
    fn write_then_read_json() {
        let store = MemoryStore::new();
        write_json(&store, "numbers", &vec![1u32, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = read_json(&store, "numbers");
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
}
