//! Core error types for Aurial
use thiserror::Error;

use crate::types::{QualityTier, TrackId};

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Aurial
#[derive(Error, Debug)]
pub enum CoreError {
    /// The quality resolver could not produce a stream URL
    #[error("Failed to resolve stream for {track_id} at {tier}: {message}")]
    Resolve {
        /// Track the URL was requested for
        track_id: TrackId,
        /// Tier that was requested
        tier: QualityTier,
        /// Collaborator supplied reason
        message: String,
    },

    /// The audio transport rejected a command
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization errors (preference values are JSON encoded)
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a resolver error
    pub fn resolve(track_id: &TrackId, tier: QualityTier, msg: impl Into<String>) -> Self {
        Self::Resolve {
            track_id: track_id.clone(),
            tier,
            message: msg.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
