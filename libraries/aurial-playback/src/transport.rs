//! Audio transport interface
//!
//! The transport is the single audio output (an `<audio>` element in the
//! browser, a native sink elsewhere). Only the player holds it; every other
//! actor goes through the player's methods.

use aurial_core::Result;
use serde::{Deserialize, Serialize};

/// Audio output driven by the player
///
/// Calls never block. Results of a call (metadata, playback starting,
/// failures) come back later as `TransportEvent`s.
pub trait Transport: Send {
    /// Replace the source with `url` and start fetching it
    fn load(&mut self, url: &str);

    /// Start or resume playback
    ///
    /// May be refused (autoplay policy, no source); the player logs and
    /// carries on.
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Jump to `position` seconds
    fn seek(&mut self, position: f64);

    /// Current position in seconds
    fn current_time(&self) -> f64;

    /// Duration of the loaded source, once metadata is known
    fn duration(&self) -> Option<f64>;

    /// Whether output is paused
    fn is_paused(&self) -> bool;

    /// Whether output is muted
    fn is_muted(&self) -> bool;

    /// Mute or unmute output
    fn set_muted(&mut self, muted: bool);

    /// Set output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);
}

/// Callbacks from the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportEvent {
    /// Source metadata is available
    LoadedMetadata {
        /// Source duration in seconds, when finite
        duration: Option<f64>,
    },

    /// Playback was requested
    Play,

    /// Audio is actually coming out
    Playing,

    /// Playback paused
    Pause,

    /// Periodic position update
    TimeUpdate {
        /// Position in seconds
        position: f64,
    },

    /// Source played to its end
    Ended,

    /// Source failed to load or decode
    Error {
        /// Transport supplied description
        message: String,
    },

    /// Volume or mute changed on the transport side
    VolumeChange,
}
