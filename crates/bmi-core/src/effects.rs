//! Projection of accessibility settings onto the runtime environment.
//!
//! [`apply`] is pure: it maps settings to the full set of desired
//! environment attributes. [`EnvironmentMutationSet::apply_to`] pushes that
//! set into an [`Environment`]. Every attribute is set to an absolute
//! state, so applying the same set twice changes nothing.

use std::collections::BTreeSet;
use std::fmt;

use crate::settings::AccessibilitySettings;

/// Font scale at text size 0.
pub const BASE_FONT_SCALE_PERCENT: u16 = 100;

/// Font scale change per text-size step.
pub const FONT_SCALE_STEP_PERCENT: i16 = 10;

/// A class flag on the environment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvironmentFlag {
    DarkTheme,
    FocusNavigation,
    HighlightLinks,
    LargeCursor,
    DisableAnimations,
}

impl EnvironmentFlag {
    pub const ALL: [EnvironmentFlag; 5] = [
        Self::DarkTheme,
        Self::FocusNavigation,
        Self::HighlightLinks,
        Self::LargeCursor,
        Self::DisableAnimations,
    ];

    /// Class name the rendering layer styles against.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::DarkTheme => "dark",
            Self::FocusNavigation => "focus-navigation",
            Self::HighlightLinks => "highlight-links",
            Self::LargeCursor => "large-cursor",
            Self::DisableAnimations => "disable-animations",
        }
    }
}

impl fmt::Display for EnvironmentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// One desired attribute state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Root font size as a percentage.
    FontScale(u16),
    /// Class flag present or absent.
    Flag(EnvironmentFlag, bool),
}

/// The full desired environment state for a settings value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMutationSet {
    mutations: Vec<Mutation>,
}

impl EnvironmentMutationSet {
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn font_scale_percent(&self) -> u16 {
        self.mutations
            .iter()
            .find_map(|m| match m {
                Mutation::FontScale(percent) => Some(*percent),
                Mutation::Flag(..) => None,
            })
            .unwrap_or(BASE_FONT_SCALE_PERCENT)
    }

    /// Desired state of a class flag.
    pub fn flag(&self, flag: EnvironmentFlag) -> bool {
        self.mutations
            .iter()
            .any(|m| *m == Mutation::Flag(flag, true))
    }

    /// Push every attribute into `env`. Returns how many attributes changed.
    pub fn apply_to(&self, env: &mut dyn Environment) -> usize {
        let mut changed = 0;
        for mutation in &self.mutations {
            let did_change = match *mutation {
                Mutation::FontScale(percent) => env.set_font_scale(percent),
                Mutation::Flag(flag, enabled) => env.set_flag(flag, enabled),
            };
            if did_change {
                changed += 1;
            }
        }
        changed
    }
}

/// Map settings to the desired environment state.
pub fn apply(settings: &AccessibilitySettings) -> EnvironmentMutationSet {
    let settings = settings.normalized();
    let scale = BASE_FONT_SCALE_PERCENT as i16 + FONT_SCALE_STEP_PERCENT * settings.text_size as i16;
    let scale = u16::try_from(scale).unwrap_or(BASE_FONT_SCALE_PERCENT);

    EnvironmentMutationSet {
        mutations: vec![
            Mutation::FontScale(scale),
            Mutation::Flag(EnvironmentFlag::DarkTheme, settings.dark_mode),
            Mutation::Flag(EnvironmentFlag::FocusNavigation, settings.navigation_focus),
            Mutation::Flag(EnvironmentFlag::HighlightLinks, settings.highlight_links),
            Mutation::Flag(EnvironmentFlag::LargeCursor, settings.large_cursor),
            Mutation::Flag(
                EnvironmentFlag::DisableAnimations,
                settings.disable_animations,
            ),
        ],
    }
}

/// Surface that honors the mutations (a document root, a terminal theme...).
///
/// Setters take absolute states and report whether anything changed.
pub trait Environment {
    fn set_font_scale(&mut self, percent: u16) -> bool;

    fn set_flag(&mut self, flag: EnvironmentFlag, enabled: bool) -> bool;
}

/// In-memory environment: a font scale and a set of active classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentState {
    font_scale_percent: u16,
    classes: BTreeSet<EnvironmentFlag>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            font_scale_percent: BASE_FONT_SCALE_PERCENT,
            classes: BTreeSet::new(),
        }
    }
}

impl EnvironmentState {
    pub fn font_scale_percent(&self) -> u16 {
        self.font_scale_percent
    }

    pub fn has_flag(&self, flag: EnvironmentFlag) -> bool {
        self.classes.contains(&flag)
    }

    /// Active class names in a stable order.
    pub fn class_names(&self) -> Vec<&'static str> {
        self.classes.iter().map(EnvironmentFlag::class_name).collect()
    }
}

impl Environment for EnvironmentState {
    fn set_font_scale(&mut self, percent: u16) -> bool {
        let changed = self.font_scale_percent != percent;
        self.font_scale_percent = percent;
        changed
    }

    fn set_flag(&mut self, flag: EnvironmentFlag, enabled: bool) -> bool {
        if enabled {
            self.classes.insert(flag)
        } else {
            self.classes.remove(&flag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{TEXT_SIZE_MAX, TEXT_SIZE_MIN};

    #[test]
    fn test_font_scale_follows_text_size() {
        let scale = |text_size| {
            apply(&AccessibilitySettings {
                text_size,
                ..Default::default()
            })
            .font_scale_percent()
        };
        assert_eq!(scale(0), 100);
        assert_eq!(scale(TEXT_SIZE_MIN), 70);
        assert_eq!(scale(TEXT_SIZE_MAX), 150);
        assert_eq!(scale(2), 120);
    }

    #[test]
    fn test_flags_mirror_settings() {
        let settings = AccessibilitySettings {
            dark_mode: true,
            large_cursor: true,
            ..Default::default()
        };
        let set = apply(&settings);
        assert!(set.flag(EnvironmentFlag::DarkTheme));
        assert!(set.flag(EnvironmentFlag::LargeCursor));
        assert!(!set.flag(EnvironmentFlag::HighlightLinks));
        assert_eq!(set.mutations().len(), 6);
    }

    #[test]
    fn test_apply_twice_is_noop() {
        let settings = AccessibilitySettings {
            navigation_focus: true,
            text_size: 3,
            disable_animations: true,
            ..Default::default()
        };
        let mut env = EnvironmentState::default();
        let first = apply(&settings).apply_to(&mut env);
        let snapshot = env.clone();
        let second = apply(&settings).apply_to(&mut env);

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(env, snapshot);
        assert_eq!(env.class_names(), vec!["focus-navigation", "disable-animations"]);
    }

    #[test]
    fn test_turning_flag_off_removes_class() {
        let mut env = EnvironmentState::default();
        let on = AccessibilitySettings {
            highlight_links: true,
            ..Default::default()
        };
        apply(&on).apply_to(&mut env);
        assert!(env.has_flag(EnvironmentFlag::HighlightLinks));

        apply(&AccessibilitySettings::default()).apply_to(&mut env);
        assert!(!env.has_flag(EnvironmentFlag::HighlightLinks));
        assert_eq!(env, EnvironmentState::default());
    }
}
