//! Accessibility preferences.
//!
//! Settings are loaded from the `accessibilitySettings` key at startup and
//! saved on every change. Fields missing from the stored object take their
//! default values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest text-size step (70% font scale).
pub const TEXT_SIZE_MIN: i8 = -3;

/// Largest text-size step (150% font scale).
pub const TEXT_SIZE_MAX: i8 = 5;

/// User accessibility preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessibilitySettings {
    /// Show a strong outline around the focused element.
    pub navigation_focus: bool,
    /// Text-size step in `[TEXT_SIZE_MIN, TEXT_SIZE_MAX]`, 0 is the default size.
    pub text_size: i8,
    /// Underline and color all links.
    pub highlight_links: bool,
    /// Use an enlarged pointer.
    pub large_cursor: bool,
    /// Dark color theme.
    pub dark_mode: bool,
    /// Reduce motion.
    pub disable_animations: bool,
}

impl AccessibilitySettings {
    /// Copy with `text_size` clamped into range.
    pub fn normalized(self) -> Self {
        Self {
            text_size: self.text_size.clamp(TEXT_SIZE_MIN, TEXT_SIZE_MAX),
            ..self
        }
    }

    /// Read a boolean setting.
    pub fn flag(&self, setting: Setting) -> bool {
        match setting {
            Setting::NavigationFocus => self.navigation_focus,
            Setting::HighlightLinks => self.highlight_links,
            Setting::LargeCursor => self.large_cursor,
            Setting::DarkMode => self.dark_mode,
            Setting::DisableAnimations => self.disable_animations,
        }
    }

    /// Copy with one boolean setting flipped.
    pub fn toggled(self, setting: Setting) -> Self {
        let mut next = self;
        let slot = match setting {
            Setting::NavigationFocus => &mut next.navigation_focus,
            Setting::HighlightLinks => &mut next.highlight_links,
            Setting::LargeCursor => &mut next.large_cursor,
            Setting::DarkMode => &mut next.dark_mode,
            Setting::DisableAnimations => &mut next.disable_animations,
        };
        *slot = !*slot;
        next
    }

    /// Copy with the text size moved by `delta` steps, saturating at the bounds.
    pub fn with_text_size_delta(self, delta: i8) -> Self {
        Self {
            text_size: self
                .text_size
                .saturating_add(delta)
                .clamp(TEXT_SIZE_MIN, TEXT_SIZE_MAX),
            ..self
        }
    }
}

/// A boolean accessibility setting that can be toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    NavigationFocus,
    HighlightLinks,
    LargeCursor,
    DarkMode,
    DisableAnimations,
}

impl Setting {
    /// All toggleable settings in panel order.
    pub const ALL: [Setting; 5] = [
        Self::NavigationFocus,
        Self::HighlightLinks,
        Self::LargeCursor,
        Self::DarkMode,
        Self::DisableAnimations,
    ];

    /// Name used in the stored settings object.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NavigationFocus => "navigationFocus",
            Self::HighlightLinks => "highlightLinks",
            Self::LargeCursor => "largeCursor",
            Self::DarkMode => "darkMode",
            Self::DisableAnimations => "disableAnimations",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Setting {
    type Err = String;

    /// Accepts the stored camelCase name or its kebab-case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|setting| setting.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown setting '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_all_off() {
        let settings = AccessibilitySettings::default();
        assert_eq!(settings.text_size, 0);
        assert!(Setting::ALL.iter().all(|s| !settings.flag(*s)));
    }

    #[test]
    fn test_partial_object_merges_with_defaults() {
        let settings: AccessibilitySettings =
            serde_json::from_str(r#"{"darkMode":true,"textSize":2}"#).unwrap();
        assert!(settings.dark_mode);
        assert_eq!(settings.text_size, 2);
        assert!(!settings.large_cursor);
    }

    #[test]
    fn test_normalized_clamps_text_size() {
        let settings = AccessibilitySettings {
            text_size: 12,
            ..Default::default()
        };
        assert_eq!(settings.normalized().text_size, TEXT_SIZE_MAX);
        let settings = AccessibilitySettings {
            text_size: -9,
            ..Default::default()
        };
        assert_eq!(settings.normalized().text_size, TEXT_SIZE_MIN);
    }

    #[test]
    fn test_toggle_is_involution() {
        let original = AccessibilitySettings::default();
        for setting in Setting::ALL {
            let once = original.toggled(setting);
            assert!(once.flag(setting));
            assert_eq!(once.toggled(setting), original);
        }
    }

    #[test]
    fn test_text_size_saturates() {
        let mut settings = AccessibilitySettings::default();
        for _ in 0..10 {
            settings = settings.with_text_size_delta(1);
        }
        assert_eq!(settings.text_size, TEXT_SIZE_MAX);
        for _ in 0..20 {
            settings = settings.with_text_size_delta(-1);
        }
        assert_eq!(settings.text_size, TEXT_SIZE_MIN);
        assert_eq!(settings.with_text_size_delta(i8::MIN).text_size, TEXT_SIZE_MIN);
    }

    #[test]
    fn test_setting_parses_both_spellings() {
        assert_eq!("darkMode".parse::<Setting>(), Ok(Setting::DarkMode));
        assert_eq!("dark-mode".parse::<Setting>(), Ok(Setting::DarkMode));
        assert_eq!(
            "disable_animations".parse::<Setting>(),
            Ok(Setting::DisableAnimations)
        );
        assert!("textSize".parse::<Setting>().is_err());
    }

    #[test]
    fn test_serialized_layout() {
        let settings = AccessibilitySettings {
            dark_mode: true,
            text_size: -1,
            ..Default::default()
        };
        insta::assert_json_snapshot!(settings, @r#"
        {
          "navigationFocus": false,
          "textSize": -1,
          "highlightLinks": false,
          "largeCursor": false,
          "darkMode": true,
          "disableAnimations": false
        }
        "#);
    }
}
