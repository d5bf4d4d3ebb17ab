//! Durable key-value storage.
//!
//! Values are stored as serialized JSON strings under fixed keys, one
//! writer per process. Two backends are provided:
//!
//! - [`FileStore`] - one `<key>.json` file per key, atomic writes
//! - [`MemoryStore`] - in-process map for tests and ephemeral sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key holding the serialized [`AccessibilitySettings`](crate::AccessibilitySettings).
pub const ACCESSIBILITY_SETTINGS_KEY: &str = "accessibilitySettings";
/// Key holding the active locale code.
pub const LANGUAGE_KEY: &str = "language";
/// Key holding the calculation history.
pub const HISTORY_KEY: &str = "bmiHistory";
/// Key holding the cookie-consent decision.
pub const COOKIE_CONSENT_KEY: &str = "cookieConsent";
/// Key holding the guided-tour seen flag.
pub const TOUR_SEEN_KEY: &str = "hasSeenTour";

/// Get/set access to serialized values that survive process restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
