//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Playback state
///
/// `ErrorRecovering` is entered from `Loading` or `Playing` when the
/// transport fails and lasts until the fallback reload or the skip lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// No track loaded
    #[default]
    Idle,

    /// Track assigned, waiting for the stream URL or for the transport
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Track reached its end and nothing follows
    Ended,

    /// Transport error being handled (fallback or skip pending)
    ErrorRecovering,
}

impl PlaybackState {
    /// Whether a track is assigned to the transport
    pub fn has_track(self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the `Off → All → One → Off` cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Why the player moved past a track without it finishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Catalog marks the track as not streamable
    Unavailable,

    /// No stream URL could be resolved
    NoStream,

    /// Transport failed and no quality fallback was possible or it failed too
    PlaybackFailed {
        /// Transport supplied message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_through_all_modes() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }

    #[test]
    fn defaults() {
        assert_eq!(RepeatMode::default(), RepeatMode::Off);
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
        assert!(!PlaybackState::Idle.has_track());
        assert!(PlaybackState::Ended.has_track());
    }
}
