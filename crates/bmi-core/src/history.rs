//! Bounded calculation history.
//!
//! The log keeps the five most recent calculations, newest first. Appending
//! a sixth record evicts the oldest. The whole sequence is stored under the
//! `bmiHistory` key after every change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bmi::{BmiCategory, BmiResult};
use crate::store::{PersistedStore, SubscriptionId, Updated};
use crate::storage::{HISTORY_KEY, KeyValueStore};
use crate::validate::Measurements;

/// Maximum number of records retained.
pub const HISTORY_CAPACITY: usize = 5;

/// One completed calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiRecord {
    /// When the calculation finished.
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "weight", deserialize_with = "number_or_string")]
    pub weight_kg: f64,

    #[serde(rename = "height", deserialize_with = "number_or_string")]
    pub height_cm: f64,

    /// BMI rounded to one decimal place.
    #[serde(rename = "bmi")]
    pub bmi_value: f64,

    pub category: BmiCategory,
}

impl BmiRecord {
    pub fn new(timestamp: DateTime<Utc>, measurements: Measurements, result: BmiResult) -> Self {
        Self {
            timestamp,
            weight_kg: measurements.weight_kg,
            height_cm: measurements.height_cm,
            bmi_value: result.value,
            category: result.category,
        }
    }

    /// Get relative time string (e.g., "2 hours ago", "Yesterday").
    pub fn relative_time(&self, now: DateTime<Utc>) -> String {
        let duration = now.signed_duration_since(self.timestamp);

        if duration.num_minutes() < 1 {
            "Just now".to_string()
        } else if duration.num_minutes() < 60 {
            let mins = duration.num_minutes();
            format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
        } else if duration.num_hours() < 24 {
            let hours = duration.num_hours();
            format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
        } else if duration.num_days() == 1 {
            "Yesterday".to_string()
        } else if duration.num_days() < 7 {
            format!("{} days ago", duration.num_days())
        } else {
            self.timestamp.format("%b %d, %Y").to_string()
        }
    }
}

/// Older stored history kept the raw form input, so weights and heights
/// may be strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{text}'"))),
    }
}

/// Newest-first, capacity-limited record log backed by durable storage.
#[derive(Debug)]
pub struct HistoryLog {
    store: PersistedStore<Vec<BmiRecord>>,
}

impl HistoryLog {
    /// Load the log. Malformed or absent data yields an empty log.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let store = PersistedStore::load_with(backend, HISTORY_KEY, Vec::new(), |mut records| {
            records.truncate(HISTORY_CAPACITY);
            records
        });
        tracing::debug!(records = store.get().len(), "history loaded");
        Self { store }
    }

    /// Records, newest first.
    pub fn records(&self) -> &[BmiRecord] {
        self.store.get()
    }

    pub fn latest(&self) -> Option<&BmiRecord> {
        self.records().first()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Prepend a record, evicting the oldest beyond capacity.
    pub fn append(&mut self, record: BmiRecord) -> Updated<Vec<BmiRecord>> {
        self.store.update(move |previous| {
            std::iter::once(record)
                .chain(previous.iter().take(HISTORY_CAPACITY - 1).cloned())
                .collect()
        })
    }

    /// Drop every record.
    pub fn clear(&mut self) -> Updated<Vec<BmiRecord>> {
        self.store.set(Vec::new())
    }

    /// Register a callback invoked after every change.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&Vec<BmiRecord>) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmi::compute;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn record(weight_kg: f64) -> BmiRecord {
        let measurements = Measurements {
            weight_kg,
            height_cm: 180.0,
        };
        BmiRecord::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            measurements,
            compute(weight_kg, 180.0),
        )
    }

    #[test]
    fn test_append_keeps_newest_five() {
        let mut log = HistoryLog::load(Arc::new(MemoryStore::new()));
        for weight in 1..=6 {
            let _ = log.append(record(f64::from(weight) * 10.0));
        }

        let weights: Vec<f64> = log.records().iter().map(|r| r.weight_kg).collect();
        assert_eq!(weights, vec![60.0, 50.0, 40.0, 30.0, 20.0]);
        assert_eq!(log.latest().map(|r| r.weight_kg), Some(60.0));
    }

    #[test]
    fn test_malformed_history_loads_empty() {
        let mem = Arc::new(MemoryStore::with_values([(HISTORY_KEY, "{\"oops\":")]));
        let log = HistoryLog::load(mem);
        assert!(log.is_empty());
    }

    #[test]
    fn test_overlong_stored_history_is_truncated() {
        let records: Vec<BmiRecord> = (1..=8).map(|w| record(f64::from(w) * 10.0)).collect();
        let raw = serde_json::to_string(&records).unwrap();
        let log = HistoryLog::load(Arc::new(MemoryStore::with_values([(HISTORY_KEY, raw)])));
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log.latest().map(|r| r.weight_kg), Some(10.0));
    }

    #[test]
    fn test_accepts_string_measurements() {
        let raw = r#"[{"date":"2024-05-01T12:00:00.000Z","weight":"70","height":"175","bmi":22.9,"category":"normal"}]"#;
        let log = HistoryLog::load(Arc::new(MemoryStore::with_values([(HISTORY_KEY, raw)])));
        assert_eq!(log.len(), 1);
        let record = &log.records()[0];
        assert_eq!(record.weight_kg, 70.0);
        assert_eq!(record.height_cm, 175.0);
        assert_eq!(record.category, BmiCategory::Normal);
    }

    #[test]
    fn test_stored_field_names() {
        let value = serde_json::to_value(record(70.0)).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["bmi", "category", "date", "height", "weight"]);
        assert_eq!(object["category"], "normal");
    }

    #[test]
    fn test_clear_empties_and_persists() {
        let mem = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::load(mem.clone());
        let _ = log.append(record(70.0));
        let cleared = log.clear();
        assert!(cleared.is_persisted());
        assert!(log.is_empty());
        assert_eq!(mem.get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_relative_time() {
        let entry = record(70.0);
        assert_eq!(entry.relative_time(entry.timestamp), "Just now");
        assert_eq!(
            entry.relative_time(entry.timestamp + Duration::minutes(1)),
            "1 minute ago"
        );
        assert_eq!(
            entry.relative_time(entry.timestamp + Duration::hours(3)),
            "3 hours ago"
        );
        assert_eq!(
            entry.relative_time(entry.timestamp + Duration::days(1)),
            "Yesterday"
        );
        assert_eq!(
            entry.relative_time(entry.timestamp + Duration::days(30)),
            "May 01, 2024"
        );
    }
}
