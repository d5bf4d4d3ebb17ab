//! Active locale and localized text lookup.
//!
//! The string tables are opaque to the rest of the crate: callers ask a
//! [`LocaleProvider`] for the table of a [`Locale`] and look texts up by
//! [`TextKey`]. Text direction is a pure function of the locale code.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bmi::BmiCategory;
use crate::settings::Setting;
use crate::store::{PersistedStore, SubscriptionId, Updated};
use crate::storage::{KeyValueStore, LANGUAGE_KEY};

/// Supported locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    He,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Self::En, Self::He];

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::He => "he",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::En => Direction::Ltr,
            Self::He => Direction::Rtl,
        }
    }

    /// The locale after this one in [`Locale::ALL`], wrapping around.
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|l| l == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported locale '{s}'"))
    }
}

/// Writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of the localized string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextKey {
    Title,
    Weight,
    Height,
    Calculate,
    YourBmi,
    LastResults,
    NoResultsYet,
    EnterValidWeight,
    EnterValidHeight,
    Underweight,
    Normal,
    Overweight,
    Obese,
    Accessibility,
    NavigationFocus,
    IncreaseText,
    DecreaseText,
    HighlightLinks,
    LargeCursor,
    DarkMode,
    DisableAnimations,
    NextStep,
    SkipTour,
    FinishTour,
    TourWelcome,
    TourCalculator,
    TourResults,
    TourHistory,
    TourAccessibility,
    TourWelcomeBody,
    TourCalculatorBody,
    TourResultsBody,
    TourHistoryBody,
    TourAccessibilityBody,
    CookieMessage,
    AcceptCookies,
    RejectCookies,
    KeyboardShortcuts,
    PressL,
    PressA,
    PressQuestion,
    Close,
}

impl TextKey {
    pub fn for_category(category: BmiCategory) -> Self {
        match category {
            BmiCategory::Underweight => Self::Underweight,
            BmiCategory::Normal => Self::Normal,
            BmiCategory::Overweight => Self::Overweight,
            BmiCategory::Obese => Self::Obese,
        }
    }

    pub fn for_setting(setting: Setting) -> Self {
        match setting {
            Setting::NavigationFocus => Self::NavigationFocus,
            Setting::HighlightLinks => Self::HighlightLinks,
            Setting::LargeCursor => Self::LargeCursor,
            Setting::DarkMode => Self::DarkMode,
            Setting::DisableAnimations => Self::DisableAnimations,
        }
    }
}

/// Immutable string table for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTable {
    locale: Locale,
    entries: BTreeMap<TextKey, &'static str>,
}

impl TextTable {
    pub fn new(locale: Locale, entries: impl IntoIterator<Item = (TextKey, &'static str)>) -> Self {
        Self {
            locale,
            entries: entries.into_iter().collect(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn direction(&self) -> Direction {
        self.locale.direction()
    }

    /// Localized text, or `None` if the table has no entry for `key`.
    pub fn lookup(&self, key: TextKey) -> Option<&'static str> {
        self.entries.get(&key).copied()
    }

    /// Localized text, falling back to the key name.
    pub fn get(&self, key: TextKey) -> String {
        self.lookup(key)
            .map_or_else(|| format!("{key:?}"), str::to_string)
    }
}

/// Source of string tables.
pub trait LocaleProvider: Send + Sync {
    fn table(&self, locale: Locale) -> Arc<TextTable>;
}

/// Tables compiled into the binary.
#[derive(Debug, Clone)]
pub struct BuiltinLocales {
    en: Arc<TextTable>,
    he: Arc<TextTable>,
}

impl Default for BuiltinLocales {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinLocales {
    pub fn new() -> Self {
        Self {
            en: Arc::new(english()),
            he: Arc::new(hebrew()),
        }
    }
}

impl LocaleProvider for BuiltinLocales {
    fn table(&self, locale: Locale) -> Arc<TextTable> {
        match locale {
            Locale::En => Arc::clone(&self.en),
            Locale::He => Arc::clone(&self.he),
        }
    }
}

fn english() -> TextTable {
    TextTable::new(
        Locale::En,
        [
            (TextKey::Title, "BMI Calculator"),
            (TextKey::Weight, "Weight (kg)"),
            (TextKey::Height, "Height (cm)"),
            (TextKey::Calculate, "Calculate BMI"),
            (TextKey::YourBmi, "Your BMI"),
            (TextKey::LastResults, "Previous Results"),
            (TextKey::NoResultsYet, "No results yet"),
            (TextKey::EnterValidWeight, "Please enter a valid weight"),
            (TextKey::EnterValidHeight, "Please enter a valid height"),
            (TextKey::Underweight, "Underweight"),
            (TextKey::Normal, "Normal"),
            (TextKey::Overweight, "Overweight"),
            (TextKey::Obese, "Obese"),
            (TextKey::Accessibility, "Accessibility"),
            (TextKey::NavigationFocus, "Navigation Focus"),
            (TextKey::IncreaseText, "Increase Text Size"),
            (TextKey::DecreaseText, "Decrease Text Size"),
            (TextKey::HighlightLinks, "Highlight Links"),
            (TextKey::LargeCursor, "Large Cursor"),
            (TextKey::DarkMode, "Dark Mode"),
            (TextKey::DisableAnimations, "Disable Animations"),
            (TextKey::NextStep, "Next"),
            (TextKey::SkipTour, "Skip"),
            (TextKey::FinishTour, "Finish"),
            (TextKey::TourWelcome, "Welcome to BMI Calculator!"),
            (TextKey::TourCalculator, "Enter your data here to calculate your BMI"),
            (TextKey::TourResults, "Your results will appear here"),
            (TextKey::TourHistory, "View your previous calculations here"),
            (TextKey::TourAccessibility, "Access accessibility options here"),
            (
                TextKey::TourWelcomeBody,
                "This guided tour will help you learn how to use the BMI Calculator.",
            ),
            (
                TextKey::TourCalculatorBody,
                "Enter your weight and height here to calculate your BMI.",
            ),
            (
                TextKey::TourResultsBody,
                "Your BMI results will be displayed here after calculation.",
            ),
            (
                TextKey::TourHistoryBody,
                "Your last 5 calculations will be saved here for easy reference.",
            ),
            (
                TextKey::TourAccessibilityBody,
                "Access accessibility options by clicking this button.",
            ),
            (TextKey::CookieMessage, "We use cookies to improve your experience"),
            (TextKey::AcceptCookies, "Accept"),
            (TextKey::RejectCookies, "Reject"),
            (TextKey::KeyboardShortcuts, "Keyboard Shortcuts"),
            (TextKey::PressL, "Press L to switch language"),
            (TextKey::PressA, "Press A to open accessibility menu"),
            (TextKey::PressQuestion, "Press ? to show this help dialog"),
            (TextKey::Close, "Close"),
        ],
    )
}

fn hebrew() -> TextTable {
    TextTable::new(
        Locale::He,
        [
            (TextKey::Title, "מחשבון BMI"),
            (TextKey::Weight, "משקל (ק״ג)"),
            (TextKey::Height, "גובה (ס״מ)"),
            (TextKey::Calculate, "חשב BMI"),
            (TextKey::YourBmi, "ה-BMI שלך"),
            (TextKey::LastResults, "תוצאות קודמות"),
            (TextKey::NoResultsYet, "אין תוצאות עדיין"),
            (TextKey::EnterValidWeight, "אנא הכנס משקל תקף"),
            (TextKey::EnterValidHeight, "אנא הכנס גובה תקף"),
            (TextKey::Underweight, "תת-משקל"),
            (TextKey::Normal, "משקל תקין"),
            (TextKey::Overweight, "עודף משקל"),
            (TextKey::Obese, "השמנת יתר"),
            (TextKey::Accessibility, "נגישות"),
            (TextKey::NavigationFocus, "מיקוד ניווט"),
            (TextKey::IncreaseText, "הגדל טקסט"),
            (TextKey::DecreaseText, "הקטן טקסט"),
            (TextKey::HighlightLinks, "הדגש קישורים"),
            (TextKey::LargeCursor, "סמן גדול"),
            (TextKey::DarkMode, "מצב כהה"),
            (TextKey::DisableAnimations, "כבה אנימציות"),
            (TextKey::NextStep, "הבא"),
            (TextKey::SkipTour, "דלג"),
            (TextKey::FinishTour, "סיים"),
            (TextKey::TourWelcome, "ברוכים הבאים למחשבון BMI!"),
            (TextKey::TourCalculator, "הכנס את הנתונים שלך כאן כדי לחשב את ה-BMI שלך"),
            (TextKey::TourResults, "התוצאות שלך יופיעו כאן"),
            (TextKey::TourHistory, "צפה בחישובים הקודמים שלך כאן"),
            (TextKey::TourAccessibility, "גש לאפשרויות נגישות כאן"),
            (
                TextKey::TourWelcomeBody,
                "סיור מודרך זה יעזור לך ללמוד כיצד להשתמש במחשבון BMI.",
            ),
            (
                TextKey::TourCalculatorBody,
                "הזן את המשקל והגובה שלך כאן כדי לחשב את ה-BMI שלך.",
            ),
            (TextKey::TourResultsBody, "תוצאות ה-BMI שלך יוצגו כאן לאחר החישוב."),
            (
                TextKey::TourHistoryBody,
                "5 החישובים האחרונים שלך יישמרו כאן לצורך התייחסות קלה.",
            ),
            (
                TextKey::TourAccessibilityBody,
                "גש לאפשרויות נגישות על ידי לחיצה על כפתור זה.",
            ),
            (TextKey::CookieMessage, "אנו משתמשים בעוגיות כדי לשפר את החוויה שלך"),
            (TextKey::AcceptCookies, "אשר"),
            (TextKey::RejectCookies, "דחה"),
            (TextKey::KeyboardShortcuts, "קיצורי מקלדת"),
            (TextKey::PressL, "לחץ L כדי להחליף שפה"),
            (TextKey::PressA, "לחץ A כדי לפתוח את תפריט הנגישות"),
            (TextKey::PressQuestion, "לחץ ? כדי להציג את תיבת הדו-שיח הזו"),
            (TextKey::Close, "סגור"),
        ],
    )
}

/// Snapshot of the active locale for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleState {
    pub code: Locale,
    pub direction: Direction,
    pub text_table: Arc<TextTable>,
}

/// Persisted active locale with its string table.
pub struct LocaleStore {
    store: PersistedStore<Locale>,
    provider: Arc<dyn LocaleProvider>,
    table: Arc<TextTable>,
}

impl LocaleStore {
    /// Load the active locale. Unknown stored codes fall back to `default`.
    ///
    /// Both the JSON form (`"he"`) and a bare code (`he`) are accepted.
    pub fn load(
        backend: Arc<dyn KeyValueStore>,
        provider: Arc<dyn LocaleProvider>,
        default: Locale,
    ) -> Self {
        let store = PersistedStore::load_or_parse(backend, LANGUAGE_KEY, default, |raw| {
            raw.parse::<Locale>().ok()
        });
        let table = provider.table(*store.get());
        Self {
            store,
            provider,
            table,
        }
    }

    pub fn locale(&self) -> Locale {
        *self.store.get()
    }

    pub fn direction(&self) -> Direction {
        self.locale().direction()
    }

    pub fn table(&self) -> &TextTable {
        &self.table
    }

    /// Localized text for `key` in the active locale.
    pub fn text(&self, key: TextKey) -> String {
        self.table.get(key)
    }

    pub fn state(&self) -> LocaleState {
        LocaleState {
            code: self.locale(),
            direction: self.direction(),
            text_table: Arc::clone(&self.table),
        }
    }

    /// Switch to the next supported locale.
    pub fn toggle(&mut self) -> Updated<Locale> {
        let next = self.locale().next();
        self.set(next)
    }

    pub fn set(&mut self, locale: Locale) -> Updated<Locale> {
        let updated = self.store.set(locale);
        self.table = self.provider.table(updated.value);
        tracing::info!(locale = %updated.value, direction = %updated.value.direction(), "locale changed");
        updated
    }

    pub fn subscribe(&mut self, listener: impl Fn(&Locale) + Send + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }
}

impl fmt::Debug for LocaleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleStore")
            .field("locale", &self.locale())
            .finish_non_exhaustive()
    }
}
