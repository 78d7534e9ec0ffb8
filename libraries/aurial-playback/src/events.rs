//! Player events
//!
//! Typed notifications for UI synchronization. Events are emitted at key
//! points:
//! - State changes (loading/playing/paused/ended)
//! - Track and queue changes
//! - Quality fallback attempts and skipped tracks
//! - Sleep timer lifecycle
//!
//! Delivery uses a broadcast channel, so any number of subscribers can listen
//! and a slow subscriber only loses its own backlog.

use aurial_core::{QualityTier, TrackId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::types::{PlaybackState, RepeatMode, SkipReason};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A different track was assigned to the transport
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// Queue position of the new track
        index: usize,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Queue changed (replaced or tracks added)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        active: bool,
    },

    /// Repeat mode cycled
    RepeatChanged {
        /// New repeat mode
        mode: RepeatMode,
    },

    /// Volume or mute changed
    VolumeChanged {
        /// User volume (0.0-1.0)
        volume: f32,
        /// Whether audio is muted
        muted: bool,
    },

    /// Position update from the transport
    PositionChanged {
        /// Current position in seconds
        position: f64,
        /// Transport duration in seconds, when known
        duration: Option<f64>,
    },

    /// The stream failed and a lower quality is being requested
    FallbackAttempted {
        /// Track being retried
        track_id: TrackId,
        /// Tier requested for the retry
        tier: QualityTier,
    },

    /// A track was passed over without finishing
    TrackSkipped {
        /// Track that was skipped
        track_id: TrackId,
        /// Why it could not be played
        reason: SkipReason,
    },

    /// Nothing left to play
    QueueExhausted,

    /// Preferred stream quality changed
    QualityChanged {
        /// New preferred tier
        tier: QualityTier,
    },

    /// Sleep timer armed (or re-armed)
    SleepTimerArmed {
        /// Minutes until playback pauses
        minutes: f64,
    },

    /// Sleep timer cancelled before it fired
    SleepTimerCleared,

    /// Sleep timer ran out and paused playback
    SleepTimerFired,

    /// Track played long enough to count as listened
    PlayLogged {
        /// Track that was listened to
        track_id: TrackId,
    },
}

/// Broadcast fan-out for `PlayerEvent`s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event
    ///
    /// Having no subscribers is not an error.
    pub fn emit(&self, event: PlayerEvent) {
        trace!(?event, "Player event");
        let _ = self.sender.send(event);
    }

    /// Subscribe to every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Collect whatever is currently buffered for `receiver`
///
/// Lagged receivers skip the dropped events and keep reading.
pub fn drain_events(receiver: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}
