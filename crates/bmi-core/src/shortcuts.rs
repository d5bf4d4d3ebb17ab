//! Global keyboard shortcuts.

use crate::locale::TextKey;

/// What a shortcut asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ToggleLocale,
    OpenAccessibilityPanel,
    ShowHelp,
}

/// Map a key press to an intent.
///
/// Shortcuts are ignored while the user is typing into an input field.
pub fn intent_for_key(key: char, typing_in_input: bool) -> Option<Intent> {
    if typing_in_input {
        return None;
    }
    match key {
        'l' | 'L' => Some(Intent::ToggleLocale),
        'a' | 'A' => Some(Intent::OpenAccessibilityPanel),
        '?' => Some(Intent::ShowHelp),
        _ => None,
    }
}

/// Help lines shown by the shortcuts dialog.
pub const HELP_LINES: [TextKey; 3] = [TextKey::PressL, TextKey::PressA, TextKey::PressQuestion];
