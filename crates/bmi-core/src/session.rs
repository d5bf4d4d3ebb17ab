//! Session controller: the composition root for all client state.
//!
//! A [`Session`] owns one instance of every store and the environment the
//! accessibility settings are projected onto. Front ends hold the session
//! and send it user intents; nothing here is global.
//!
//! # Calculations
//!
//! A calculation has a simulated latency. It runs in three steps so a UI
//! can stay responsive while it is in flight:
//!
//! 1. [`Session::begin_compute`] validates and captures the inputs and marks
//!    the session busy. A second request while busy fails with
//!    [`ComputeError::Busy`].
//! 2. [`PendingComputation::wait`] sleeps for the configured delay.
//! 3. [`Session::finish_compute`] computes, appends to the history and
//!    clears the busy flag. Only the session that started the computation
//!    can finish it.
//!
//! Dropping a pending computation cancels it: the busy flag is cleared and
//! no history entry is written. [`Session::calculate`] runs all three steps.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;

use crate::bmi::{self, BmiResult};
use crate::config::SessionConfig;
use crate::effects::{self, Environment, EnvironmentState};
use crate::error::{ComputeError, PersistenceError, ValidationErrors};
use crate::history::{BmiRecord, HistoryLog};
use crate::locale::{
    BuiltinLocales, Direction, Locale, LocaleProvider, LocaleState, LocaleStore, TextKey,
};
use crate::onboarding::{ConsentDecision, ConsentStore, Tour};
use crate::settings::{AccessibilitySettings, Setting};
use crate::shortcuts::{self, Intent};
use crate::storage::{ACCESSIBILITY_SETTINGS_KEY, FileStore, KeyValueStore};
use crate::store::{PersistedStore, SubscriptionId, Updated};
use crate::validate::{Field, Measurements, validate_measurements};

/// Clears the session busy flag when dropped.
#[derive(Debug)]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A validated calculation waiting out its latency.
#[derive(Debug)]
#[must_use = "dropping a pending computation cancels it"]
pub struct PendingComputation {
    measurements: Measurements,
    delay: Duration,
    guard: InFlightGuard,
}

impl PendingComputation {
    /// Inputs captured when the request was accepted.
    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    /// Suspend for the simulated latency.
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// A finished calculation.
#[derive(Debug)]
pub struct Calculation {
    pub result: BmiResult,
    pub record: BmiRecord,
    /// Set when the history could not be saved.
    pub persist_error: Option<PersistenceError>,
}

/// Everything the rendering layer needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub settings: AccessibilitySettings,
    pub locale: LocaleState,
    pub latest: Option<BmiResult>,
    pub history: Vec<BmiRecord>,
    pub computing: bool,
}

/// Builder for [`Session`].
pub struct SessionBuilder<E = EnvironmentState> {
    backend: Arc<dyn KeyValueStore>,
    provider: Arc<dyn LocaleProvider>,
    environment: E,
    compute_delay: Duration,
    prefers_dark: bool,
    default_locale: Locale,
}

impl SessionBuilder<EnvironmentState> {
    fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let defaults = SessionConfig::default();
        Self {
            backend,
            provider: Arc::new(BuiltinLocales::new()),
            environment: EnvironmentState::default(),
            compute_delay: defaults.compute_delay(),
            prefers_dark: defaults.prefers_dark,
            default_locale: defaults.default_locale,
        }
    }
}

impl<E: Environment> SessionBuilder<E> {
    /// Apply the relevant fields of a loaded configuration.
    pub fn config(mut self, config: &SessionConfig) -> Self {
        self.compute_delay = config.compute_delay();
        self.prefers_dark = config.prefers_dark;
        self.default_locale = config.default_locale;
        self
    }

    pub fn compute_delay(mut self, delay: Duration) -> Self {
        self.compute_delay = delay;
        self
    }

    /// System dark-mode preference, used only when no settings are stored.
    pub fn prefers_dark(mut self, prefers_dark: bool) -> Self {
        self.prefers_dark = prefers_dark;
        self
    }

    pub fn default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    pub fn locale_provider(mut self, provider: Arc<dyn LocaleProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Project settings onto a custom environment.
    pub fn environment<F: Environment>(self, environment: F) -> SessionBuilder<F> {
        SessionBuilder {
            backend: self.backend,
            provider: self.provider,
            environment,
            compute_delay: self.compute_delay,
            prefers_dark: self.prefers_dark,
            default_locale: self.default_locale,
        }
    }

    /// Load every store and apply the initial settings to the environment.
    pub fn open(self) -> Session<E> {
        let mut startup_warnings = Vec::new();
        let mut settings = PersistedStore::load_with(
            Arc::clone(&self.backend),
            ACCESSIBILITY_SETTINGS_KEY,
            AccessibilitySettings::default(),
            AccessibilitySettings::normalized,
        );
        if self.prefers_dark && !settings.origin().had_stored_value() {
            tracing::info!("no stored settings, following system dark-mode preference");
            let updated = settings.update(|s| AccessibilitySettings {
                dark_mode: true,
                ..*s
            });
            startup_warnings.extend(updated.persist_error);
        }

        let mut session = Session {
            settings,
            locale: LocaleStore::load(
                Arc::clone(&self.backend),
                self.provider,
                self.default_locale,
            ),
            history: HistoryLog::load(Arc::clone(&self.backend)),
            consent: ConsentStore::load(Arc::clone(&self.backend)),
            tour: Tour::load(Arc::clone(&self.backend)),
            environment: self.environment,
            latest: None,
            field_errors: ValidationErrors::default(),
            compute_delay: self.compute_delay,
            in_flight: Arc::new(AtomicBool::new(false)),
            accessibility_panel_open: false,
            help_open: false,
            startup_warnings,
        };
        session.apply_effects();
        tracing::info!(
            locale = %session.locale.locale(),
            history = session.history.len(),
            "session opened"
        );
        session
    }
}

/// Owns the client state of one user session.
pub struct Session<E = EnvironmentState> {
    settings: PersistedStore<AccessibilitySettings>,
    locale: LocaleStore,
    history: HistoryLog,
    consent: ConsentStore,
    tour: Tour,
    environment: E,
    latest: Option<BmiResult>,
    field_errors: ValidationErrors,
    compute_delay: Duration,
    in_flight: Arc<AtomicBool>,
    accessibility_panel_open: bool,
    help_open: bool,
    startup_warnings: Vec<PersistenceError>,
}

impl Session<EnvironmentState> {
    pub fn builder(backend: Arc<dyn KeyValueStore>) -> SessionBuilder<EnvironmentState> {
        SessionBuilder::new(backend)
    }

    /// Open a file-backed session described by `config`.
    pub fn from_config(config: &SessionConfig) -> Self {
        let dir = config.resolved_storage_dir();
        tracing::debug!(dir = %dir.display(), "opening file-backed session");
        Self::builder(Arc::new(FileStore::new(dir)))
            .config(config)
            .open()
    }
}

impl<E: Environment> Session<E> {
    // =========================================================================
    // CALCULATION
    // =========================================================================

    /// Validate inputs and start a calculation.
    ///
    /// On invalid input nothing is computed and the history is untouched.
    pub fn begin_compute(
        &mut self,
        weight_raw: &str,
        height_raw: &str,
    ) -> Result<PendingComputation, ComputeError> {
        if self.in_flight.load(Ordering::Acquire) {
            tracing::debug!("compute request ignored, calculation in flight");
            return Err(ComputeError::Busy);
        }

        let measurements = match validate_measurements(weight_raw, height_raw) {
            Ok(measurements) => {
                self.field_errors = ValidationErrors::default();
                measurements
            }
            Err(errors) => {
                tracing::debug!(%errors, "compute request rejected");
                self.field_errors = errors.clone();
                return Err(ComputeError::Invalid(errors));
            }
        };

        self.in_flight.store(true, Ordering::Release);
        Ok(PendingComputation {
            measurements,
            delay: self.compute_delay,
            guard: InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            },
        })
    }

    /// Compute a pending calculation and append it to the history.
    ///
    /// A computation started by another session is rejected and cancelled.
    pub fn finish_compute(
        &mut self,
        pending: PendingComputation,
    ) -> Result<Calculation, ComputeError> {
        if !Arc::ptr_eq(&pending.guard.flag, &self.in_flight) {
            tracing::warn!("rejected a calculation started by another session");
            return Err(ComputeError::ForeignComputation);
        }

        let measurements = pending.measurements;
        let result = bmi::compute(measurements.weight_kg, measurements.height_cm);
        let record = BmiRecord::new(Utc::now(), measurements, result);

        let updated = self.history.append(record.clone());
        self.latest = Some(result);
        drop(pending);

        tracing::info!(
            bmi = result.value,
            category = %result.category,
            "calculation complete"
        );
        Ok(Calculation {
            result,
            record,
            persist_error: updated.persist_error,
        })
    }

    /// Validate, wait out the latency, compute and record.
    pub async fn calculate(
        &mut self,
        weight_raw: &str,
        height_raw: &str,
    ) -> Result<Calculation, ComputeError> {
        let pending = self.begin_compute(weight_raw, height_raw)?;
        pending.wait().await;
        self.finish_compute(pending)
    }

    /// Durable writes that failed while the session was opening.
    pub fn startup_warnings(&self) -> &[PersistenceError] {
        &self.startup_warnings
    }

    /// Whether a calculation is in flight.
    pub fn is_computing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Result of the last calculation in this session.
    pub fn latest_result(&self) -> Option<BmiResult> {
        self.latest
    }

    /// Validation errors from the last compute request.
    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    /// Localized error text for a field, if it failed validation.
    pub fn field_error_text(&self, field: Field) -> Option<String> {
        let error = match field {
            Field::Weight => self.field_errors.weight.as_ref(),
            Field::Height => self.field_errors.height.as_ref(),
        }?;
        let key = match error.field {
            Field::Weight => TextKey::EnterValidWeight,
            Field::Height => TextKey::EnterValidHeight,
        };
        Some(self.locale.text(key))
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn clear_history(&mut self) -> Updated<Vec<BmiRecord>> {
        tracing::info!("clearing history");
        self.history.clear()
    }

    pub fn subscribe_history(
        &mut self,
        listener: impl Fn(&Vec<BmiRecord>) + Send + 'static,
    ) -> SubscriptionId {
        self.history.subscribe(listener)
    }

    // =========================================================================
    // ACCESSIBILITY
    // =========================================================================

    pub fn settings(&self) -> &AccessibilitySettings {
        self.settings.get()
    }

    /// Flip a boolean setting and re-apply the environment.
    pub fn toggle_setting(&mut self, setting: Setting) -> Updated<AccessibilitySettings> {
        let updated = self.settings.update(|s| s.toggled(setting));
        tracing::debug!(%setting, enabled = updated.value.flag(setting), "setting toggled");
        self.apply_effects();
        updated
    }

    /// Move the text size by `delta` steps, clamped, and re-apply.
    pub fn set_text_size(&mut self, delta: i8) -> Updated<AccessibilitySettings> {
        let updated = self.settings.update(|s| s.with_text_size_delta(delta));
        tracing::debug!(text_size = updated.value.text_size, "text size changed");
        self.apply_effects();
        updated
    }

    pub fn increase_text_size(&mut self) -> Updated<AccessibilitySettings> {
        self.set_text_size(1)
    }

    pub fn decrease_text_size(&mut self) -> Updated<AccessibilitySettings> {
        self.set_text_size(-1)
    }

    pub fn subscribe_settings(
        &mut self,
        listener: impl Fn(&AccessibilitySettings) + Send + 'static,
    ) -> SubscriptionId {
        self.settings.subscribe(listener)
    }

    pub fn unsubscribe_settings(&mut self, id: SubscriptionId) -> bool {
        self.settings.unsubscribe(id)
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Project the current settings onto the environment.
    fn apply_effects(&mut self) {
        let changed = effects::apply(self.settings.get()).apply_to(&mut self.environment);
        tracing::debug!(changed, "environment updated");
    }

    pub fn is_accessibility_panel_open(&self) -> bool {
        self.accessibility_panel_open
    }

    pub fn set_accessibility_panel_open(&mut self, open: bool) {
        self.accessibility_panel_open = open;
    }

    // =========================================================================
    // LOCALE
    // =========================================================================

    pub fn locale(&self) -> Locale {
        self.locale.locale()
    }

    pub fn direction(&self) -> Direction {
        self.locale.direction()
    }

    pub fn text(&self, key: TextKey) -> String {
        self.locale.text(key)
    }

    pub fn toggle_locale(&mut self) -> Updated<Locale> {
        self.locale.toggle()
    }

    pub fn set_locale(&mut self, locale: Locale) -> Updated<Locale> {
        self.locale.set(locale)
    }

    pub fn subscribe_locale(&mut self, listener: impl Fn(&Locale) + Send + 'static) -> SubscriptionId {
        self.locale.subscribe(listener)
    }

    // =========================================================================
    // ONBOARDING
    // =========================================================================

    pub fn consent(&self) -> Option<ConsentDecision> {
        self.consent.decision()
    }

    pub fn needs_consent_prompt(&self) -> bool {
        self.consent.needs_prompt()
    }

    pub fn record_consent(&mut self, decision: ConsentDecision) -> Updated<Option<ConsentDecision>> {
        self.consent.record(decision)
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn tour_mut(&mut self) -> &mut Tour {
        &mut self.tour
    }

    // =========================================================================
    // SHORTCUTS
    // =========================================================================

    /// Run the shortcut bound to `key`, returning the intent that fired.
    pub fn handle_key(&mut self, key: char, typing_in_input: bool) -> Option<Intent> {
        let intent = shortcuts::intent_for_key(key, typing_in_input)?;
        match intent {
            Intent::ToggleLocale => {
                let updated = self.toggle_locale();
                if let Some(error) = updated.persist_error {
                    tracing::warn!(error = %error, "locale change was not saved");
                }
            }
            Intent::OpenAccessibilityPanel => self.accessibility_panel_open = true,
            Intent::ShowHelp => self.help_open = true,
        }
        Some(intent)
    }

    pub fn is_help_open(&self) -> bool {
        self.help_open
    }

    /// Close the help dialog and the accessibility panel.
    pub fn close_overlays(&mut self) {
        self.help_open = false;
        self.accessibility_panel_open = false;
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            settings: *self.settings.get(),
            locale: self.locale.state(),
            latest: self.latest,
            history: self.history.records().to_vec(),
            computing: self.is_computing(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("settings", self.settings.get())
            .field("locale", &self.locale)
            .field("history", &self.history.len())
            .field("environment", &self.environment)
            .field("computing", &self.in_flight.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
