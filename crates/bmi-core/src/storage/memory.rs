//! In-process storage backend.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::KeyValueStore;
use crate::error::{PersistenceError, Result};

/// Keeps values in a map for the lifetime of the process.
///
/// Writes can be made to fail on demand to exercise the non-fatal
/// persistence path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Make subsequent writes fail as if storage quota were exhausted.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Release);
    }

    /// Number of successful writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values.lock().map_err(|_| PersistenceError::Rejected {
            key: String::new(),
            reason: "storage lock poisoned".to_string(),
        })
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.reject_writes.load(Ordering::Acquire) {
            return Err(PersistenceError::Rejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_values_are_readable() {
        let store = MemoryStore::with_values([("language", "\"he\"")]);
        assert_eq!(store.get("language").unwrap().as_deref(), Some("\"he\""));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_rejected_write_leaves_value_unchanged() {
        let store = MemoryStore::with_values([("language", "\"en\"")]);
        store.set_reject_writes(true);
        assert!(store.set("language", "\"he\"").is_err());
        assert_eq!(store.get("language").unwrap().as_deref(), Some("\"en\""));

        store.set_reject_writes(false);
        store.set("language", "\"he\"").unwrap();
        assert_eq!(store.write_count(), 1);
    }
}
