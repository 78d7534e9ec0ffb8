//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Transport and resolver failures never show up here: the player absorbs
/// them and reports through `PlayerEvent`s instead.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Sleep timer duration was not a positive, finite number of minutes
    #[error("Invalid sleep timer duration: {0} minutes")]
    InvalidSleepDuration(f64),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The runtime driving the player has shut down
    #[error("Player runtime is not running")]
    RuntimeClosed,

    /// Error from a core collaborator
    #[error(transparent)]
    Core(#[from] aurial_core::CoreError),
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
