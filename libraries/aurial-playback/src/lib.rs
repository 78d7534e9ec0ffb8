//! Aurial - Playback Orchestration
//!
//! Platform-agnostic playback engine for the Aurial web player.
//!
//! This crate provides:
//! - Play queue with shuffle and repeat (Off, All, One)
//! - Playback state machine driving an audio transport
//! - One-shot quality fallback when a hi-res stream fails
//! - Automatic skip past unplayable tracks
//! - Sleep timer
//! - Volume and mute with persisted preferences
//! - Media session, media key and keyboard shortcut integration
//!
//! # Architecture
//!
//! `aurial-playback` never touches a DOM or an audio device:
//! - Audio output is a `Transport` the host implements
//! - Stream URLs come from a `QualityResolver`
//! - OS media controls are a `MediaSurface`
//! - State changes go out as typed `PlayerEvent`s
//!
//! `Player` is a synchronous state machine. `PlayerRuntime` drives it from
//! tokio, resolving stream URLs and firing deferred work.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aurial_core::Track;
//! use aurial_playback::{
//!     MemoryPreferenceStore, NoopSurface, PlaybackConfig, PlaybackState, Player, Transport,
//!     TransportEvent,
//! };
//! # struct Silent;
//! # impl Transport for Silent {
//! #     fn load(&mut self, _url: &str) {}
//! #     fn play(&mut self) -> aurial_core::Result<()> { Ok(()) }
//! #     fn pause(&mut self) {}
//! #     fn seek(&mut self, _position: f64) {}
//! #     fn current_time(&self) -> f64 { 0.0 }
//! #     fn duration(&self) -> Option<f64> { None }
//! #     fn is_paused(&self) -> bool { true }
//! #     fn is_muted(&self) -> bool { false }
//! #     fn set_muted(&mut self, _muted: bool) {}
//! #     fn set_volume(&mut self, _volume: f32) {}
//! # }
//!
//! let mut player = Player::new(
//!     PlaybackConfig::default(),
//!     Box::new(Silent),
//!     Box::new(NoopSurface),
//!     Box::new(MemoryPreferenceStore::new()),
//! );
//!
//! let tracks = vec![
//!     Arc::new(Track::new("1", "First")),
//!     Arc::new(Track::new("2", "Second")),
//! ];
//! player.set_queue(tracks, 0);
//! player.play_track_from_queue(None);
//!
//! // Hand the URL request to the resolver, then feed the answer back
//! let request = player.take_resolve_requests().remove(0);
//! player.complete_resolve(request.ticket, Ok(Some("https://cdn.example/1.flac".into())));
//! player.handle_transport_event(TransportEvent::Playing);
//! assert_eq!(player.state(), PlaybackState::Playing);
//!
//! // Natural end moves on to the next track
//! player.handle_transport_event(TransportEvent::Ended);
//! assert_eq!(player.current_index(), Some(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod order;
pub mod player;
pub mod preferences;
pub mod queue;
pub mod runtime;
pub mod shortcuts;
pub mod sleep_timer;
pub mod surface;
pub mod timers;
pub mod transport;
pub mod types;
pub mod volume;

// Re-export main types
pub use config::PlaybackConfig;
pub use error::{PlaybackError, Result};
pub use events::{drain_events, EventBus, PlayerEvent};
pub use fallback::{FallbackController, FallbackDecision};
pub use player::{
    Player, PlayerSnapshot, ResolvePurpose, ResolveRequest, ResolveTicket,
};
pub use preferences::{MemoryPreferenceStore, Preferences};
pub use queue::Queue;
pub use runtime::{Command, PlayerHandle, PlayerRuntime};
pub use shortcuts::Shortcut;
pub use sleep_timer::SleepTimer;
pub use surface::{
    CastState, MediaKey, MediaMetadata, MediaSurface, NoopSurface, PositionState,
    SessionPlaybackState,
};
pub use transport::{Transport, TransportEvent};
pub use types::{PlaybackState, RepeatMode, SkipReason};
pub use volume::Volume;
