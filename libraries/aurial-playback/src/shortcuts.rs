//! Keyboard shortcuts
//!
//! Maps key names as reported by the browser (`KeyboardEvent.key`) to player
//! actions. Keys that only drive UI chrome (search focus, panels) are not
//! player actions and map to nothing.

use serde::{Deserialize, Serialize};

/// Player action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Shortcut {
    /// Space
    PlayPause,
    /// Shift+Right
    Next,
    /// Shift+Left
    Previous,
    /// Right
    SeekForward,
    /// Left
    SeekBackward,
    /// Up
    VolumeUp,
    /// Down
    VolumeDown,
    /// M
    ToggleMute,
    /// S
    ToggleShuffle,
    /// R
    CycleRepeat,
}

impl Shortcut {
    /// Resolve a key press, case-insensitively
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        let shortcut = match key.to_ascii_lowercase().as_str() {
            " " | "space" | "spacebar" => Shortcut::PlayPause,
            "arrowright" if shift => Shortcut::Next,
            "arrowright" => Shortcut::SeekForward,
            "arrowleft" if shift => Shortcut::Previous,
            "arrowleft" => Shortcut::SeekBackward,
            "arrowup" => Shortcut::VolumeUp,
            "arrowdown" => Shortcut::VolumeDown,
            "m" => Shortcut::ToggleMute,
            "s" => Shortcut::ToggleShuffle,
            "r" => Shortcut::CycleRepeat,
            _ => return None,
        };
        Some(shortcut)
    }

    /// Whether the host should suppress the key's default action (page
    /// scrolling)
    pub fn prevents_default(self) -> bool {
        matches!(
            self,
            Shortcut::PlayPause | Shortcut::VolumeUp | Shortcut::VolumeDown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_depend_on_shift() {
        assert_eq!(Shortcut::from_key("ArrowRight", true), Some(Shortcut::Next));
        assert_eq!(
            Shortcut::from_key("ArrowRight", false),
            Some(Shortcut::SeekForward)
        );
        assert_eq!(Shortcut::from_key("ArrowLeft", true), Some(Shortcut::Previous));
        assert_eq!(
            Shortcut::from_key("ArrowLeft", false),
            Some(Shortcut::SeekBackward)
        );
    }

    #[test]
    fn letters_are_case_insensitive() {
        assert_eq!(Shortcut::from_key("M", false), Some(Shortcut::ToggleMute));
        assert_eq!(Shortcut::from_key("s", true), Some(Shortcut::ToggleShuffle));
        assert_eq!(Shortcut::from_key("R", false), Some(Shortcut::CycleRepeat));
    }

    #[test]
    fn space_and_unknown_keys() {
        assert_eq!(Shortcut::from_key(" ", false), Some(Shortcut::PlayPause));
        assert!(Shortcut::PlayPause.prevents_default());
        assert_eq!(Shortcut::from_key("q", false), None);
        assert_eq!(Shortcut::from_key("/", false), None);
    }
}
