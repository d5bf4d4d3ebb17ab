//! Client state for BMI Studio.
//!
//! This crate holds everything behind the calculator UI: durable state
//! stores, the bounded calculation history, BMI computation and input
//! validation, accessibility settings and their projection onto a display
//! environment, localization and first-visit onboarding.
//!
//! # Architecture
//!
//! - `storage/` - Key-value backends (`FileStore`, `MemoryStore`)
//! - `store.rs` - `PersistedStore<T>`: load with fallback, update, subscribe
//! - `history.rs` - Bounded, newest-first calculation log
//! - `settings.rs` / `effects.rs` - Accessibility settings and the pure applier
//! - `locale.rs` - Locale store and built-in string tables
//! - `session.rs` - `Session`, the composition root the UI talks to
//! - `error.rs` - Error types with user-friendly messages
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bmi_core::{MemoryStore, Session, Setting};
//!
//! let mut session = Session::builder(Arc::new(MemoryStore::new())).open();
//! let calculation = session.calculate("70", "175").await?;
//! assert_eq!(calculation.result.value, 22.9);
//!
//! let _ = session.toggle_setting(Setting::DarkMode);
//! ```

mod bmi;
mod config;
mod effects;
mod error;
mod history;
mod locale;
mod onboarding;
mod session;
mod settings;
mod shortcuts;
pub mod storage;
mod store;
mod validate;

pub use bmi::{BmiCategory, BmiResult, compute, round_one_decimal};
pub use config::{DEFAULT_COMPUTE_DELAY_MS, SessionConfig};
pub use effects::{
    BASE_FONT_SCALE_PERCENT, Environment, EnvironmentFlag, EnvironmentMutationSet,
    EnvironmentState, FONT_SCALE_STEP_PERCENT, Mutation, apply,
};
pub use error::{
    ComputeError, InvalidReason, PersistenceError, Result, ValidationError, ValidationErrors,
};
pub use history::{BmiRecord, HISTORY_CAPACITY, HistoryLog};
pub use locale::{
    BuiltinLocales, Direction, Locale, LocaleProvider, LocaleState, LocaleStore, TextKey,
    TextTable,
};
pub use onboarding::{ConsentDecision, ConsentStore, Tour, TourStep};
pub use session::{Calculation, PendingComputation, Session, SessionBuilder, SessionSnapshot};
pub use settings::{AccessibilitySettings, Setting, TEXT_SIZE_MAX, TEXT_SIZE_MIN};
pub use shortcuts::{HELP_LINES, Intent, intent_for_key};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{LoadOrigin, PersistedStore, SubscriptionId, Updated};
pub use validate::{
    Field, MAX_HEIGHT_CM, MAX_WEIGHT_KG, Measurements, validate, validate_measurements,
};
