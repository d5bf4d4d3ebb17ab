//! First-visit state: the cookie-consent decision and the guided tour.
//!
//! Both are small persisted values. The banner and the tour overlay
//! themselves belong to the rendering layer.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::locale::TextKey;
use crate::store::{PersistedStore, Updated};
use crate::storage::{COOKIE_CONSENT_KEY, KeyValueStore, TOUR_SEEN_KEY};

/// The user's answer to the cookie banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentDecision {
    Accepted,
    Rejected,
}

impl ConsentDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ConsentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accepted" => Ok(Self::Accepted),
            "reject" | "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown consent decision '{other}'")),
        }
    }
}

/// Persisted cookie-consent decision. Absent until the user answers.
#[derive(Debug)]
pub struct ConsentStore {
    store: PersistedStore<Option<ConsentDecision>>,
}

impl ConsentStore {
    /// Load the decision, accepting `"accepted"` as well as a bare `accepted`.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let store = PersistedStore::load_or_parse(backend, COOKIE_CONSENT_KEY, None, |raw| {
            raw.parse::<ConsentDecision>().ok().map(Some)
        });
        Self { store }
    }

    pub fn decision(&self) -> Option<ConsentDecision> {
        *self.store.get()
    }

    /// Whether the banner should be shown.
    pub fn needs_prompt(&self) -> bool {
        self.decision().is_none()
    }

    pub fn record(&mut self, decision: ConsentDecision) -> Updated<Option<ConsentDecision>> {
        tracing::info!(%decision, "cookie consent recorded");
        self.store.set(Some(decision))
    }
}

/// Stored marker for a finished tour, serialized as the string `"true"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum TourSeen {
    #[serde(rename = "true")]
    Seen,
}

/// One stop of the guided tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourStep {
    Welcome,
    Calculator,
    Results,
    History,
    Accessibility,
}

impl TourStep {
    /// Steps in presentation order.
    pub const ALL: [TourStep; 5] = [
        Self::Welcome,
        Self::Calculator,
        Self::Results,
        Self::History,
        Self::Accessibility,
    ];

    /// UI region the step points at.
    pub fn target(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Calculator => "calculator",
            Self::Results => "results",
            Self::History => "history",
            Self::Accessibility => "accessibility",
        }
    }

    pub fn title_key(&self) -> TextKey {
        match self {
            Self::Welcome => TextKey::TourWelcome,
            Self::Calculator => TextKey::TourCalculator,
            Self::Results => TextKey::TourResults,
            Self::History => TextKey::TourHistory,
            Self::Accessibility => TextKey::TourAccessibility,
        }
    }

    /// Explanatory text shown under the title.
    pub fn body_key(&self) -> TextKey {
        match self {
            Self::Welcome => TextKey::TourWelcomeBody,
            Self::Calculator => TextKey::TourCalculatorBody,
            Self::Results => TextKey::TourResultsBody,
            Self::History => TextKey::TourHistoryBody,
            Self::Accessibility => TextKey::TourAccessibilityBody,
        }
    }
}

/// Guided-tour progress for this session plus the persisted seen flag.
#[derive(Debug)]
pub struct Tour {
    seen: PersistedStore<Option<TourSeen>>,
    step: Option<usize>,
}

impl Tour {
    /// Load the tour. It starts at the first step unless already seen.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let seen = PersistedStore::load_or_parse(backend, TOUR_SEEN_KEY, None, |raw| {
            (raw == "true").then_some(Some(TourSeen::Seen))
        });
        let step = if seen.get().is_some() { None } else { Some(0) };
        Self { seen, step }
    }

    pub fn has_been_seen(&self) -> bool {
        self.seen.get().is_some()
    }

    /// Step currently shown, `None` when the tour is not active.
    pub fn current(&self) -> Option<TourStep> {
        self.step.map(|index| TourStep::ALL[index])
    }

    /// Zero-based position of the current step.
    pub fn position(&self) -> Option<usize> {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == Some(TourStep::ALL.len() - 1)
    }

    /// Move to the next step, finishing the tour after the last one.
    pub fn advance(&mut self) -> Option<TourStep> {
        match self.step {
            Some(index) if index + 1 < TourStep::ALL.len() => {
                self.step = Some(index + 1);
                self.current()
            }
            Some(_) => {
                self.finish();
                None
            }
            None => None,
        }
    }

    /// End the tour early. It will not be shown again.
    pub fn skip(&mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.step = None;
        let updated = self.seen.set(Some(TourSeen::Seen));
        if let Some(error) = updated.persist_error {
            tracing::warn!(error = %error, "tour completion was not saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{BuiltinLocales, Locale, LocaleProvider};
    use crate::storage::MemoryStore;

    fn seeded(key: &'static str, raw: &'static str) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_values([(key, raw)]))
    }

    #[test]
    fn test_consent_absent_needs_prompt() {
        let consent = ConsentStore::load(Arc::new(MemoryStore::new()));
        assert!(consent.needs_prompt());
    }

    #[test]
    fn test_consent_is_stored_as_plain_word() {
        let mem = Arc::new(MemoryStore::new());
        let mut consent = ConsentStore::load(mem.clone());
        let _ = consent.record(ConsentDecision::Rejected);
        assert_eq!(
            mem.get(COOKIE_CONSENT_KEY).unwrap().as_deref(),
            Some("\"rejected\"")
        );

        let reloaded = ConsentStore::load(mem);
        assert_eq!(reloaded.decision(), Some(ConsentDecision::Rejected));
        assert!(!reloaded.needs_prompt());
    }

    #[test]
    fn test_tour_walks_all_steps_then_finishes() {
        let mem = Arc::new(MemoryStore::new());
        let mut tour = Tour::load(mem.clone());
        assert_eq!(tour.current(), Some(TourStep::Welcome));

        let mut visited = vec![TourStep::Welcome];
        while let Some(step) = tour.advance() {
            visited.push(step);
        }
        assert_eq!(visited, TourStep::ALL.to_vec());
        assert_eq!(tour.current(), None);
        assert_eq!(mem.get(TOUR_SEEN_KEY).unwrap().as_deref(), Some("\"true\""));

        let reloaded = Tour::load(mem);
        assert!(reloaded.has_been_seen());
        assert_eq!(reloaded.current(), None);
    }

    #[test]
    fn test_skip_marks_tour_seen() {
        let mem = Arc::new(MemoryStore::new());
        let mut tour = Tour::load(mem.clone());
        let _ = tour.advance();
        tour.skip();
        assert!(tour.has_been_seen());
        assert_eq!(tour.advance(), None);
    }

    #[test]
    fn test_consent_accepts_bare_words() {
        let accepted = ConsentStore::load(seeded(COOKIE_CONSENT_KEY, "accepted"));
        assert_eq!(accepted.decision(), Some(ConsentDecision::Accepted));
        assert!(!accepted.needs_prompt());

        let rejected = ConsentStore::load(seeded(COOKIE_CONSENT_KEY, "rejected"));
        assert_eq!(rejected.decision(), Some(ConsentDecision::Rejected));

        let unknown = ConsentStore::load(seeded(COOKIE_CONSENT_KEY, "maybe"));
        assert!(unknown.needs_prompt());
    }

    #[test]
    fn test_tour_accepts_bare_true() {
        let tour = Tour::load(seeded(TOUR_SEEN_KEY, "true"));
        assert!(tour.has_been_seen());
        assert_eq!(tour.current(), None);

        let tour = Tour::load(seeded(TOUR_SEEN_KEY, "false"));
        assert!(!tour.has_been_seen());
        assert_eq!(tour.current(), Some(TourStep::Welcome));
    }

    #[test]
    fn test_every_step_has_localized_title_and_body() {
        let provider = BuiltinLocales::new();
        for locale in Locale::ALL {
            let table = provider.table(locale);
            for step in TourStep::ALL {
                let title = table.lookup(step.title_key());
                let body = table.lookup(step.body_key());
                assert!(title.is_some(), "{locale}: {step:?} has no title");
                assert!(body.is_some(), "{locale}: {step:?} has no body");
                assert_ne!(title, body);
            }
        }
    }
}
