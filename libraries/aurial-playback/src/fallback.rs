//! Quality fallback controller
//!
//! When a catalog stream at the top tier fails, the player retries the same
//! track exactly once at the next tier down. The guard stays raised until the
//! cooldown after a successful retry, a failed retry, or a new load.

use std::time::Duration;

use aurial_core::{QualityTier, Track};
use tracing::debug;

/// Outcome of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Request the stream again at this tier
    Retry(QualityTier),

    /// No fallback applies; skip the track
    GiveUp,
}

/// One-shot quality downgrade guard
#[derive(Debug, Clone)]
pub struct FallbackController {
    retry_in_flight: bool,
    cooldown: Duration,
}

impl FallbackController {
    /// Create a controller that re-arms `cooldown` after a successful retry
    pub fn new(cooldown: Duration) -> Self {
        Self {
            retry_in_flight: false,
            cooldown,
        }
    }

    /// Decide what to do after the transport failed on `track`
    ///
    /// `requested` is the tier the listener asked for, not the tier the
    /// failing URL happened to resolve at. Retrying raises the guard, so a
    /// second failure before the guard is lowered gives up.
    pub fn decide(&mut self, track: &Track, requested: QualityTier) -> FallbackDecision {
        if track.is_local {
            debug!(track_id = %track.id, "No quality fallback for local file");
            return FallbackDecision::GiveUp;
        }
        if track.is_tracker_item() {
            debug!(track_id = %track.id, "No quality fallback for tracker item");
            return FallbackDecision::GiveUp;
        }
        if !requested.is_top() {
            debug!(track_id = %track.id, %requested, "Top quality not requested");
            return FallbackDecision::GiveUp;
        }
        if self.retry_in_flight {
            debug!(track_id = %track.id, "Quality fallback already attempted");
            return FallbackDecision::GiveUp;
        }

        match QualityTier::TOP.downgrade() {
            Some(tier) => {
                self.retry_in_flight = true;
                FallbackDecision::Retry(tier)
            }
            None => FallbackDecision::GiveUp,
        }
    }

    /// Lower the guard
    pub fn reset(&mut self) {
        self.retry_in_flight = false;
    }

    /// Whether a retry for the current load has been attempted
    pub fn retry_in_flight(&self) -> bool {
        self.retry_in_flight
    }

    /// Delay before the guard is lowered after a successful retry
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
