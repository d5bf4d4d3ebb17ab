//! Property-based tests for computation, validation, history and settings.
//!
//! 1. BMI equals the rounded ratio, category follows the unrounded ratio.
//! 2. Out-of-range weights are rejected and leave the history untouched.
//! 3. History never exceeds capacity and stays newest first.
//! 4. Toggling a setting twice is the identity.
//! 5. Text size stays within its bounds under any sequence of steps.
//! 6. Applying the same settings twice changes nothing the second time.

use std::sync::Arc;
use std::time::Duration;

use bmi_core::{
    AccessibilitySettings, BmiCategory, BmiRecord, EnvironmentState, Field, HISTORY_CAPACITY,
    HistoryLog, Measurements, MemoryStore, Session, Setting, TEXT_SIZE_MAX, TEXT_SIZE_MIN, apply,
    compute, validate,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn settings_strategy() -> impl Strategy<Value = AccessibilitySettings> {
    (
        prop::array::uniform5(any::<bool>()),
        TEXT_SIZE_MIN..=TEXT_SIZE_MAX,
    )
        .prop_map(|(flags, text_size)| AccessibilitySettings {
            navigation_focus: flags[0],
            text_size,
            highlight_links: flags[1],
            large_cursor: flags[2],
            dark_mode: flags[3],
            disable_animations: flags[4],
        })
}

fn setting_strategy() -> impl Strategy<Value = Setting> {
    prop::sample::select(Setting::ALL.to_vec())
}

fn record(index: usize) -> BmiRecord {
    let weight_kg = 40.0 + index as f64;
    let measurements = Measurements {
        weight_kg,
        height_cm: 170.0,
    };
    let timestamp = Utc.timestamp_opt(1_700_000_000 + index as i64 * 60, 0).unwrap();
    BmiRecord::new(timestamp, measurements, compute(weight_kg, 170.0))
}

// ── 1. Computation ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compute_matches_formula(w in 0.1f64..=500.0, h in 1.0f64..=300.0) {
        let height_m = h / 100.0;
        let raw = w / (height_m * height_m);
        let result = compute(w, h);

        // Half-up rounding to tenths, computed without the library helper.
        let scaled = raw * 10.0;
        let lower = scaled.floor() / 10.0;
        let upper = (scaled.floor() + 1.0) / 10.0;
        prop_assert!(result.value == lower || result.value == upper);
        if (scaled.fract() - 0.5).abs() > 1e-6 {
            let expected = if scaled.fract() > 0.5 { upper } else { lower };
            prop_assert_eq!(result.value, expected);
        }
        prop_assert_eq!(result.category, BmiCategory::from_bmi(raw));
    }

    #[test]
    fn valid_inputs_parse_back(w in 0.01f64..=500.0, h in 0.01f64..=300.0) {
        prop_assert_eq!(validate(Field::Weight, &w.to_string()), Ok(w));
        prop_assert_eq!(validate(Field::Height, &h.to_string()), Ok(h));
    }
}

// ── 2. Invalid weight ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn out_of_range_weight_is_rejected(
        w in prop_oneof![-1000.0f64..=0.0, 500.001f64..10_000.0],
        h in 50.0f64..=250.0,
    ) {
        let error = validate(Field::Weight, &w.to_string()).unwrap_err();
        prop_assert_eq!(error.code(), "invalid-weight");

        let mem = Arc::new(MemoryStore::new());
        let mut session = Session::builder(mem.clone())
            .compute_delay(Duration::ZERO)
            .open();
        prop_assert!(session.begin_compute(&w.to_string(), &h.to_string()).is_err());
        prop_assert!(session.history().is_empty());
        prop_assert_eq!(mem.write_count(), 0);
    }
}

// ── 3. History bound and order ──────────────────────────────────────────

proptest! {
    #[test]
    fn history_is_bounded_newest_first(count in 0usize..20) {
        let mem = Arc::new(MemoryStore::new());
        let mut log = HistoryLog::load(mem.clone());
        for index in 0..count {
            let _ = log.append(record(index));
        }

        prop_assert_eq!(log.len(), count.min(HISTORY_CAPACITY));
        let expected: Vec<BmiRecord> = (0..count)
            .rev()
            .take(HISTORY_CAPACITY)
            .map(record)
            .collect();
        prop_assert_eq!(log.records(), expected.as_slice());

        let reloaded = HistoryLog::load(mem);
        prop_assert_eq!(reloaded.records(), expected.as_slice());
    }
}

// ── 4. Toggle involution ────────────────────────────────────────────────

proptest! {
    #[test]
    fn toggle_twice_is_identity(
        settings in settings_strategy(),
        setting in setting_strategy(),
    ) {
        prop_assert_eq!(settings.toggled(setting).toggled(setting), settings);
        prop_assert_ne!(settings.toggled(setting).flag(setting), settings.flag(setting));
    }
}

// ── 5. Text-size saturation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn text_size_stays_in_bounds(deltas in prop::collection::vec(-10i8..=10, 0..30)) {
        let mut settings = AccessibilitySettings::default();
        for delta in deltas {
            let expected = (settings.text_size + delta).clamp(TEXT_SIZE_MIN, TEXT_SIZE_MAX);
            settings = settings.with_text_size_delta(delta);
            prop_assert_eq!(settings.text_size, expected);
        }
    }

    #[test]
    fn repeated_steps_saturate(steps in 8usize..20) {
        let mut up = AccessibilitySettings::default();
        let mut down = AccessibilitySettings::default();
        for _ in 0..steps {
            up = up.with_text_size_delta(1);
            down = down.with_text_size_delta(-1);
        }
        prop_assert_eq!(up.text_size, TEXT_SIZE_MAX);
        prop_assert_eq!(down.text_size, TEXT_SIZE_MIN);
    }
}

// ── 6. Applier idempotence ──────────────────────────────────────────────

proptest! {
    #[test]
    fn applier_is_idempotent(settings in settings_strategy()) {
        let mutations = apply(&settings);
        prop_assert_eq!(apply(&settings), mutations.clone());

        let mut env = EnvironmentState::default();
        mutations.apply_to(&mut env);
        let after_first = env.clone();

        prop_assert_eq!(mutations.apply_to(&mut env), 0);
        prop_assert_eq!(env, after_first);
    }
}
