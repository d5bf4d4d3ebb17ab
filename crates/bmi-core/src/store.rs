//! Typed values kept in sync with a durable key.
//!
//! A [`PersistedStore`] owns one value. Loading never fails: absent or
//! unparsable stored data falls back to the default. Every update performs
//! exactly one durable write and then notifies subscribers in registration
//! order. A failed write is reported back to the caller but the in-memory
//! value is still updated.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PersistenceError;
use crate::storage::KeyValueStore;

type Listener<T> = Box<dyn Fn(&T) + Send>;

/// Where the value of a freshly loaded store came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Parsed from durable storage.
    Stored,
    /// Nothing was stored under the key.
    Absent,
    /// Stored data could not be read or parsed and was discarded.
    Recovered,
}

impl LoadOrigin {
    /// Whether a durable value existed (even if it was unusable).
    pub fn had_stored_value(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Handle returned by [`PersistedStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of [`PersistedStore::update`].
#[derive(Debug)]
#[must_use]
pub struct Updated<T> {
    /// The new in-memory value.
    pub value: T,
    /// Set when the durable write failed. The value above is still current.
    pub persist_error: Option<PersistenceError>,
}

impl<T> Updated<T> {
    /// Whether the new value reached durable storage.
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// In-memory value bound to a durable key.
pub struct PersistedStore<T> {
    key: &'static str,
    value: T,
    origin: LoadOrigin,
    backend: Arc<dyn KeyValueStore>,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: u64,
}

impl<T> PersistedStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load the value stored under `key`, or `default` if absent or malformed.
    pub fn load(backend: Arc<dyn KeyValueStore>, key: &'static str, default: T) -> Self {
        Self::load_with(backend, key, default, |value| value)
    }

    /// Like [`load`](Self::load), passing a parsed stored value through
    /// `normalize` so invariants hold for data written by older versions.
    pub fn load_with(
        backend: Arc<dyn KeyValueStore>,
        key: &'static str,
        default: T,
        normalize: impl FnOnce(T) -> T,
    ) -> Self {
        Self::load_inner(backend, key, default, normalize, |_| None)
    }

    /// Like [`load`](Self::load), but stored text that is not JSON is handed
    /// to `parse_raw` before being discarded.
    ///
    /// Older versions wrote some keys as bare words (`he`, `accepted`). Such
    /// values are accepted here and rewritten as JSON on the next update.
    pub fn load_or_parse(
        backend: Arc<dyn KeyValueStore>,
        key: &'static str,
        default: T,
        parse_raw: impl FnOnce(&str) -> Option<T>,
    ) -> Self {
        Self::load_inner(backend, key, default, |value| value, parse_raw)
    }

    fn load_inner(
        backend: Arc<dyn KeyValueStore>,
        key: &'static str,
        default: T,
        normalize: impl FnOnce(T) -> T,
        parse_raw: impl FnOnce(&str) -> Option<T>,
    ) -> Self {
        let (value, origin) = match backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(parsed) => {
                    tracing::debug!(key, "loaded stored value");
                    (normalize(parsed), LoadOrigin::Stored)
                }
                Err(e) => match parse_raw(raw.trim()) {
                    Some(parsed) => {
                        tracing::debug!(key, "loaded stored value from plain text");
                        (parsed, LoadOrigin::Stored)
                    }
                    None => {
                        tracing::warn!(key, error = %e, "stored value is malformed, using default");
                        (default, LoadOrigin::Recovered)
                    }
                },
            },
            Ok(None) => {
                tracing::debug!(key, "no stored value, using default");
                (default, LoadOrigin::Absent)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value, using default");
                (default, LoadOrigin::Recovered)
            }
        };

        Self {
            key,
            value,
            origin,
            backend,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Durable key this store writes to.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Where the value came from when the store was loaded.
    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Compute a new value from the current one, persist it and notify
    /// subscribers.
    pub fn update(&mut self, mutator: impl FnOnce(&T) -> T) -> Updated<T> {
        let next = mutator(&self.value);
        let persist_error = self.write(&next).err();
        if let Some(error) = &persist_error {
            tracing::warn!(
                key = self.key,
                error = %error,
                "failed to persist value, keeping in-memory copy"
            );
        }

        self.value = next;
        for (_, listener) in &self.listeners {
            listener(&self.value);
        }

        Updated {
            value: self.value.clone(),
            persist_error,
        }
    }

    /// Replace the value outright.
    pub fn set(&mut self, value: T) -> Updated<T> {
        self.update(move |_| value)
    }

    /// Register a callback invoked after every update.
    pub fn subscribe(&mut self, listener: impl Fn(&T) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a previously registered callback. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn write(&self, value: &T) -> crate::error::Result<()> {
        let raw = serde_json::to_string(value).map_err(|e| PersistenceError::Serialization {
            key: self.key.to_string(),
            source: e,
        })?;
        self.backend.set(self.key, &raw)
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("origin", &self.origin)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Mutex;

    fn backend(values: &[(&str, &str)]) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_values(values.iter().copied()))
    }

    #[test]
    fn test_load_absent_uses_default() {
        let store = PersistedStore::load(backend(&[]), "counter", 7u32);
        assert_eq!(*store.get(), 7);
        assert_eq!(store.origin(), LoadOrigin::Absent);
    }

    #[test]
    fn test_load_malformed_uses_default() {
        let store = PersistedStore::load(backend(&[("counter", "{not json")]), "counter", 7u32);
        assert_eq!(*store.get(), 7);
        assert_eq!(store.origin(), LoadOrigin::Recovered);
        assert!(store.origin().had_stored_value());
    }

    #[test]
    fn test_load_with_normalizes_stored_value() {
        let store =
            PersistedStore::load_with(backend(&[("counter", "99")]), "counter", 0u32, |v| v.min(10));
        assert_eq!(*store.get(), 10);
        assert_eq!(store.origin(), LoadOrigin::Stored);
    }

    #[test]
    fn test_load_or_parse_accepts_plain_text() {
        let mem = backend(&[("word", "hello")]);
        let mut store = PersistedStore::load_or_parse(mem.clone(), "word", String::new(), |raw| {
            Some(raw.to_string())
        });
        assert_eq!(store.get(), "hello");
        assert_eq!(store.origin(), LoadOrigin::Stored);

        // The next write goes out as JSON.
        let _ = store.set("bye".to_string());
        assert_eq!(mem.get("word").unwrap().as_deref(), Some("\"bye\""));
    }

    #[test]
    fn test_load_or_parse_prefers_json() {
        let store =
            PersistedStore::load_or_parse(backend(&[("counter", "4")]), "counter", 0u32, |_| Some(9));
        assert_eq!(*store.get(), 4);
    }

    #[test]
    fn test_load_or_parse_unrecognized_text_uses_default() {
        let store =
            PersistedStore::load_or_parse(backend(&[("counter", "four")]), "counter", 0u32, |_| None);
        assert_eq!(*store.get(), 0);
        assert_eq!(store.origin(), LoadOrigin::Recovered);
    }

    #[test]
    fn test_update_writes_exactly_once() {
        let mem = backend(&[]);
        let mut store = PersistedStore::load(mem.clone(), "counter", 0u32);
        let updated = store.update(|v| v + 1);
        assert!(updated.is_persisted());
        assert_eq!(updated.value, 1);
        assert_eq!(mem.write_count(), 1);
        assert_eq!(mem.get("counter").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_failed_write_still_updates_memory() {
        let mem = backend(&[]);
        mem.set_reject_writes(true);
        let mut store = PersistedStore::load(mem.clone(), "counter", 0u32);

        let updated = store.update(|v| v + 5);
        assert!(!updated.is_persisted());
        assert!(matches!(
            updated.persist_error,
            Some(PersistenceError::Rejected { .. })
        ));
        assert_eq!(*store.get(), 5);
        assert_eq!(mem.get("counter").unwrap(), None);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = PersistedStore::load(backend(&[]), "counter", 0u32);

        let first = Arc::clone(&seen);
        store.subscribe(move |v| first.lock().unwrap().push(("first", *v)));
        let second = Arc::clone(&seen);
        store.subscribe(move |v| second.lock().unwrap().push(("second", *v)));

        let _ = store.set(3);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 3), ("second", 3)]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Arc::new(Mutex::new(0));
        let mut store = PersistedStore::load(backend(&[]), "counter", 0u32);
        let counter = Arc::clone(&count);
        let id = store.subscribe(move |_| *counter.lock().unwrap() += 1);

        let _ = store.update(|v| v + 1);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        let _ = store.update(|v| v + 1);

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
