//! Playback orchestrator
//!
//! `Player` owns the queue, the transport and every piece of playback state.
//! It is a synchronous state machine: callers feed it commands, transport
//! events, resolver answers and timer deadlines, and it never blocks. Work
//! that has to wait (stream URLs, delayed skips, the sleep timer) leaves the
//! machine as a `ResolveRequest` or a scheduled `Deferred` task and comes back
//! tagged with the load generation it belongs to.

use std::sync::Arc;
use std::time::Duration;

use aurial_core::{PreferenceStore, QualityTier, Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::error::Result;
use crate::events::{EventBus, PlayerEvent};
use crate::fallback::{FallbackController, FallbackDecision};
use crate::order;
use crate::preferences::Preferences;
use crate::queue::Queue;
use crate::shortcuts::Shortcut;
use crate::sleep_timer::SleepTimer;
use crate::surface::{
    CastState, MediaKey, MediaMetadata, MediaSurface, PositionState, SessionPlaybackState,
};
use crate::timers::{Deferred, Timers};
use crate::transport::{Transport, TransportEvent};
use crate::types::{PlaybackState, RepeatMode, SkipReason};
use crate::volume::Volume;

/// What a stream URL request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvePurpose {
    /// First URL for a freshly loaded track
    Load,

    /// Lower-quality URL after the first one failed
    Fallback,
}

/// Identity of a stream URL request
///
/// Answers carrying a ticket from an older generation are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolveTicket {
    generation: u64,
    purpose: ResolvePurpose,
}

impl ResolveTicket {
    /// Load generation the request belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Why the URL was requested
    pub fn purpose(&self) -> ResolvePurpose {
        self.purpose
    }
}

/// Stream URL the player is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Hand this back with the answer
    pub ticket: ResolveTicket,
    /// Track to resolve
    pub track_id: TrackId,
    /// Tier to resolve at
    pub tier: QualityTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Recovery {
    #[default]
    Clear,
    AwaitingFallback {
        tier: QualityTier,
    },
    SkipScheduled,
}

/// State of the track currently assigned to the transport
#[derive(Debug, Default)]
struct Session {
    track: Option<Arc<Track>>,
    // Tier the loaded URL was resolved at, for reporting
    load_quality: QualityTier,
    wants_playing: bool,
    awaiting_url: bool,
    metadata_loaded: bool,
    // Given up on and skipped past
    abandoned: bool,
    position: f64,
    duration: Option<f64>,
    pending_seek: Option<f64>,
    history_logged: bool,
    recovery: Recovery,
}

impl Session {
    /// Transport events only mean something once the source is in place and
    /// no recovery is pending
    fn accepts_transport_events(&self) -> bool {
        self.track.is_some() && !self.awaiting_url && self.recovery == Recovery::Clear
    }
}

/// Point-in-time view of the player for UI consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Playback state
    pub state: PlaybackState,
    /// Queue cursor
    pub current_index: Option<usize>,
    /// Track assigned to the transport
    pub track_id: Option<TrackId>,
    /// Queue length
    pub queue_length: usize,
    /// Whether shuffle is on
    pub shuffle_active: bool,
    /// Repeat mode
    pub repeat_mode: RepeatMode,
    /// User volume (0.0-1.0)
    pub volume: f32,
    /// Whether output is muted
    pub muted: bool,
    /// Preferred stream quality
    pub quality: QualityTier,
    /// Position in seconds
    pub position: f64,
    /// Duration of the loaded source in seconds
    pub duration: Option<f64>,
    /// Whether a sleep timer is armed
    pub sleep_timer_active: bool,
    /// Remote cast availability
    pub cast_state: CastState,
}

/// Playback orchestrator
pub struct Player {
    config: PlaybackConfig,
    transport: Box<dyn Transport>,
    surface: Box<dyn MediaSurface>,
    preferences: Box<dyn PreferenceStore>,
    events: EventBus,
    rng: StdRng,

    queue: Queue,
    state: PlaybackState,
    volume: Volume,
    quality: QualityTier,
    cast_state: CastState,

    session: Session,
    generation: u64,
    fallback: FallbackController,
    timers: Timers,
    sleep_timer: SleepTimer,

    // Pre-rolled shuffle pick so the preview matches what plays next
    up_next: Option<usize>,
    outbox: Vec<ResolveRequest>,
}

impl Player {
    /// Create a player
    ///
    /// Volume, mute and preferred quality are read from `preferences` once
    /// and pushed to the transport.
    pub fn new(
        config: PlaybackConfig,
        transport: Box<dyn Transport>,
        surface: Box<dyn MediaSurface>,
        preferences: Box<dyn PreferenceStore>,
    ) -> Self {
        let saved = Preferences::load(preferences.as_ref());
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut player = Self {
            events: EventBus::new(config.event_capacity),
            fallback: FallbackController::new(config.fallback_cooldown()),
            config,
            transport,
            surface,
            preferences,
            rng,
            queue: Queue::new(),
            state: PlaybackState::Idle,
            volume: Volume::new(saved.volume, saved.muted),
            quality: saved.quality,
            cast_state: CastState::default(),
            session: Session::default(),
            generation: 0,
            timers: Timers::new(),
            sleep_timer: SleepTimer::new(),
            up_next: None,
            outbox: Vec::new(),
        };

        player.transport.set_volume(player.volume.level());
        player.transport.set_muted(player.volume.is_muted());
        player
    }

    // ===== Queue =====

    /// Replace the queue and point the cursor at `start_index` (clamped)
    ///
    /// Does not start playback. Pending fallback or skip work for the
    /// previous track is dropped.
    pub fn set_queue(&mut self, tracks: Vec<Arc<Track>>, start_index: usize) {
        self.bump_generation();
        if self.session.awaiting_url || self.session.recovery != Recovery::Clear {
            debug!("Abandoning unfinished load");
            self.transport.pause();
            self.session = Session::default();
            self.set_state(PlaybackState::Idle);
            self.surface.clear_metadata();
        }

        self.queue.replace(tracks, start_index);
        self.reroll_up_next();

        info!(
            length = self.queue.len(),
            current_index = ?self.queue.current_index(),
            "Queue replaced"
        );
        self.events.emit(PlayerEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Append tracks, returning how many were accepted
    pub fn add_to_queue<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = Arc<Track>>,
    {
        let added = self.queue.append(tracks);
        self.queue_grew(added);
        added
    }

    /// Insert tracks right after the current one, returning how many were
    /// accepted
    pub fn add_next_to_queue<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = Arc<Track>>,
    {
        let added = self.queue.insert_next(tracks);
        self.queue_grew(added);
        added
    }

    fn queue_grew(&mut self, added: usize) {
        if added == 0 {
            return;
        }
        debug!(added, length = self.queue.len(), "Tracks enqueued");
        self.reroll_up_next();
        self.events.emit(PlayerEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Tracks in canonical order
    pub fn get_current_queue(&self) -> &[Arc<Track>] {
        self.queue.tracks()
    }

    /// What `play_next` would play, without changing anything
    pub fn get_next_track(&self) -> Option<&Arc<Track>> {
        self.upcoming_index()
            .and_then(|index| self.queue.get(index))
    }

    // ===== Navigation =====

    /// Load the track under the cursor and play it
    ///
    /// `seek` is applied once the transport has metadata. No-op on an empty
    /// queue.
    pub fn play_track_from_queue(&mut self, seek: Option<f64>) {
        let Some(index) = self.queue.current_index() else {
            debug!("Nothing to play, queue is empty");
            return;
        };
        let Some(track) = self.queue.get(index).cloned() else {
            return;
        };

        let previous_track_id = self.session.track.as_ref().map(|t| t.id.clone());
        self.bump_generation();
        if !self.transport.is_paused() {
            self.transport.pause();
        }

        let load_quality = self.quality.effective_for(&track);
        self.session = Session {
            track: Some(Arc::clone(&track)),
            load_quality,
            wants_playing: true,
            pending_seek: seek.filter(|s| s.is_finite() && *s > 0.0),
            ..Session::default()
        };
        self.reroll_up_next();

        info!(
            track_id = %track.id,
            index,
            tier = %load_quality,
            generation = self.generation,
            "Loading track"
        );
        self.events.emit(PlayerEvent::TrackChanged {
            track_id: track.id.clone(),
            index,
            previous_track_id,
        });
        self.set_state(PlaybackState::Loading);
        self.update_media_session();

        if track.is_unavailable {
            self.skip_unplayable(SkipReason::Unavailable);
            return;
        }

        self.session.awaiting_url = true;
        self.outbox.push(ResolveRequest {
            ticket: ResolveTicket {
                generation: self.generation,
                purpose: ResolvePurpose::Load,
            },
            track_id: track.id.clone(),
            tier: load_quality,
        });
    }

    /// Move the cursor to `index` and play that track
    pub fn play_at_index(&mut self, index: usize) {
        if self.queue.set_current(index) {
            self.play_track_from_queue(None);
        } else {
            debug!(index, length = self.queue.len(), "Ignoring out-of-range index");
        }
    }

    /// Skip forward
    ///
    /// Repeat-one is ignored for this step. No-op when the queue is
    /// exhausted.
    pub fn play_next(&mut self) {
        match self.upcoming_index() {
            Some(index) => self.play_at_index(index),
            None => debug!("No next track"),
        }
    }

    /// Skip back
    ///
    /// Not a plain step back. Under the restart threshold this moves to the
    /// previous track in play order. Past it the current track rewinds, and
    /// at the start of the queue without repeat the current track restarts
    /// rather than nothing happening.
    pub fn play_prev(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        let loaded = self.session.track.is_some();
        if loaded && self.session.position > self.config.restart_threshold_secs() {
            debug!(position = self.session.position, "Restarting current track");
            self.seek_to(0.0);
            return;
        }

        match order::prev_index(&self.queue, &mut self.rng) {
            Some(index) => self.play_at_index(index),
            None if loaded => self.seek_to(0.0),
            None => {}
        }
    }

    /// Flip shuffle, returning the new value
    pub fn toggle_shuffle(&mut self) -> bool {
        let active = !self.queue.shuffle_active();
        self.queue.set_shuffle(active);
        self.reroll_up_next();

        info!(active, "Shuffle toggled");
        self.events.emit(PlayerEvent::ShuffleChanged { active });
        active
    }

    /// Cycle repeat `Off → All → One → Off`, returning the new mode
    pub fn toggle_repeat(&mut self) -> RepeatMode {
        let mode = self.queue.repeat_mode().cycle();
        self.queue.set_repeat(mode);

        info!(?mode, "Repeat mode changed");
        self.events.emit(PlayerEvent::RepeatChanged { mode });
        mode
    }

    // ===== Transport control =====

    /// Toggle play/pause based on what the transport is actually doing
    ///
    /// No-op when nothing is loaded.
    pub fn handle_play_pause(&mut self) {
        if self.session.track.is_none() {
            debug!("Play/pause with nothing loaded");
            return;
        }

        match self.state {
            PlaybackState::ErrorRecovering => {
                self.session.wants_playing = !self.session.wants_playing;
            }
            PlaybackState::Loading if self.session.awaiting_url => {
                self.session.wants_playing = !self.session.wants_playing;
            }
            // The transport still holds an earlier track's audio
            PlaybackState::Ended if self.session.abandoned || !self.session.metadata_loaded => {
                self.play_track_from_queue(None);
            }
            PlaybackState::Ended => {
                self.seek_to(0.0);
                self.resume();
            }
            _ => {
                if self.transport.is_paused() {
                    self.resume();
                } else {
                    self.pause();
                }
            }
        }
    }

    /// Start or resume playback of the loaded track
    pub fn resume(&mut self) {
        if self.session.track.is_none() {
            return;
        }
        self.session.wants_playing = true;
        if self.session.awaiting_url || self.session.recovery != Recovery::Clear {
            return;
        }

        if self.start_transport()
            && matches!(self.state, PlaybackState::Paused | PlaybackState::Ended)
        {
            self.set_state(PlaybackState::Playing);
        }
    }

    /// Pause playback of the loaded track
    pub fn pause(&mut self) {
        if self.session.track.is_none() {
            return;
        }
        self.session.wants_playing = false;
        if self.session.awaiting_url || self.session.recovery != Recovery::Clear {
            return;
        }

        self.transport.pause();
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
            self.set_state(PlaybackState::Paused);
        }
        self.update_media_session_position_state();
    }

    /// Pause and rewind to the start
    pub fn stop(&mut self) {
        self.pause();
        self.seek_to(0.0);
    }

    /// Jump to `position` seconds in the loaded track
    ///
    /// Clamped to the known duration. Before metadata arrives the seek is
    /// held and applied on load.
    pub fn seek_to(&mut self, position: f64) {
        if self.session.track.is_none() || !position.is_finite() {
            return;
        }

        let mut target = position.max(0.0);
        if let Some(duration) = self.session.duration {
            target = target.min(duration);
        }

        if !self.session.metadata_loaded {
            self.session.pending_seek = Some(target);
            return;
        }

        self.transport.seek(target);
        self.session.position = target;
        self.events.emit(PlayerEvent::PositionChanged {
            position: target,
            duration: self.session.duration,
        });
        self.update_media_session_position_state();
    }

    /// Seek relative to the current position
    pub fn seek_by(&mut self, delta: f64) {
        self.seek_to(self.session.position + delta);
    }

    /// Seek to a fraction (0.0-1.0) of the track, as from a progress bar
    ///
    /// If the transport does not know the duration yet, the track is reloaded
    /// and the seek applied once metadata arrives, using the catalog
    /// duration.
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let Some(track) = self.session.track.clone() else {
            return;
        };

        let known = self
            .session
            .duration
            .or_else(|| self.transport.duration())
            .filter(|d| d.is_finite() && *d > 0.0);

        match (known, self.session.metadata_loaded) {
            (Some(duration), true) => self.seek_to(fraction * duration),
            _ => {
                let same_track = self
                    .queue
                    .current()
                    .is_some_and(|current| current.id == track.id);
                match track.duration_seconds {
                    Some(duration) if same_track => {
                        debug!(track_id = %track.id, fraction, "Reloading to seek");
                        self.play_track_from_queue(Some(fraction * duration));
                    }
                    _ => debug!(track_id = %track.id, "Cannot seek, duration unknown"),
                }
            }
        }
    }

    // ===== Volume =====

    /// Set the user volume (clamped to 0.0-1.0), returning the stored value
    ///
    /// Does not touch mute.
    pub fn set_volume(&mut self, level: f32) -> f32 {
        let stored = self.volume.set_level(level);
        self.transport.set_volume(stored);
        Preferences::save_volume(self.preferences.as_mut(), stored);
        self.emit_volume();
        stored
    }

    /// Mute or unmute without losing the volume level
    pub fn set_muted(&mut self, muted: bool) {
        self.volume.set_muted(muted);
        self.transport.set_muted(muted);
        Preferences::save_muted(self.preferences.as_mut(), muted);
        self.emit_volume();
    }

    /// Toggle mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.volume.is_muted();
        self.set_muted(muted);
        muted
    }

    fn emit_volume(&self) {
        self.events.emit(PlayerEvent::VolumeChanged {
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }

    // ===== Quality =====

    /// Change the preferred stream quality
    ///
    /// Takes effect from the next load.
    pub fn set_quality(&mut self, tier: QualityTier) {
        if tier == self.quality {
            return;
        }
        self.quality = tier;
        Preferences::save_quality(self.preferences.as_mut(), tier);

        info!(%tier, "Preferred quality changed");
        self.events.emit(PlayerEvent::QualityChanged { tier });
    }

    // ===== Sleep timer =====

    /// Pause playback `minutes` from now, replacing any armed timer
    pub fn set_sleep_timer(&mut self, minutes: f64) -> Result<()> {
        self.sleep_timer
            .arm(minutes, Instant::now(), &mut self.timers)?;

        info!(minutes, "Sleep timer armed");
        self.events.emit(PlayerEvent::SleepTimerArmed { minutes });
        Ok(())
    }

    /// Disarm the sleep timer
    pub fn clear_sleep_timer(&mut self) {
        if self.sleep_timer.clear(&mut self.timers) {
            info!("Sleep timer cleared");
            self.events.emit(PlayerEvent::SleepTimerCleared);
        }
    }

    /// Whether a sleep timer is armed
    pub fn is_sleep_timer_active(&self) -> bool {
        self.sleep_timer.is_active()
    }

    /// Time left on the sleep timer
    pub fn sleep_timer_remaining(&self) -> Option<Duration> {
        self.sleep_timer.remaining(Instant::now())
    }

    // ===== External surfaces =====

    /// Map a hardware media key onto the matching player action
    pub fn handle_media_key(&mut self, key: MediaKey) {
        debug!(?key, "Media key");
        match key {
            MediaKey::Next => self.play_next(),
            MediaKey::Previous => self.play_prev(),
            MediaKey::PlayPause => self.handle_play_pause(),
            MediaKey::Stop => self.stop(),
        }
    }

    /// Run the action bound to a keyboard shortcut
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) {
        debug!(?shortcut, "Keyboard shortcut");
        match shortcut {
            Shortcut::PlayPause => self.handle_play_pause(),
            Shortcut::Next => self.play_next(),
            Shortcut::Previous => self.play_prev(),
            Shortcut::SeekForward => self.seek_by(self.config.seek_step_secs),
            Shortcut::SeekBackward => self.seek_by(-self.config.seek_step_secs),
            Shortcut::VolumeUp => {
                self.set_volume(self.volume.level() + self.config.volume_step);
            }
            Shortcut::VolumeDown => {
                self.set_volume(self.volume.level() - self.config.volume_step);
            }
            Shortcut::ToggleMute => {
                self.toggle_mute();
            }
            Shortcut::ToggleShuffle => {
                self.toggle_shuffle();
            }
            Shortcut::CycleRepeat => {
                self.toggle_repeat();
            }
        }
    }

    /// Record the cast bridge's state
    pub fn set_cast_state(&mut self, state: CastState) {
        if state != self.cast_state {
            debug!(?state, "Cast state changed");
            self.cast_state = state;
        }
    }

    /// Last reported cast state
    pub fn cast_state(&self) -> CastState {
        self.cast_state
    }

    /// Push metadata of the loaded track to the media session
    pub fn update_media_session(&mut self) {
        match &self.session.track {
            Some(track) => {
                let metadata = MediaMetadata::from_track(track);
                self.surface.set_metadata(&metadata);
            }
            None => self.surface.clear_metadata(),
        }
    }

    /// Push the playback state to the media session
    pub fn update_media_session_playback_state(&mut self) {
        let state = match self.state {
            PlaybackState::Idle => SessionPlaybackState::None,
            PlaybackState::Playing => SessionPlaybackState::Playing,
            PlaybackState::Loading if self.session.wants_playing => SessionPlaybackState::Playing,
            _ => SessionPlaybackState::Paused,
        };
        self.surface.set_playback_state(state);
    }

    /// Push the scrubber position to the media session
    ///
    /// Skipped while the duration is unknown.
    pub fn update_media_session_position_state(&mut self) {
        let Some(duration) = self.session.duration else {
            return;
        };
        self.surface.set_position_state(PositionState {
            duration,
            position: self.session.position.clamp(0.0, duration),
            playback_rate: 1.0,
        });
    }

    // ===== Async re-entry =====

    /// Stream URLs requested since the last call
    pub fn take_resolve_requests(&mut self) -> Vec<ResolveRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Deliver the answer to a `ResolveRequest`
    ///
    /// Answers for a track the player has already moved away from are
    /// dropped.
    pub fn complete_resolve(
        &mut self,
        ticket: ResolveTicket,
        result: aurial_core::Result<Option<String>>,
    ) {
        if ticket.generation != self.generation {
            debug!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                purpose = ?ticket.purpose,
                "Discarding stale stream URL"
            );
            return;
        }

        match ticket.purpose {
            ResolvePurpose::Load => self.on_load_resolved(result),
            ResolvePurpose::Fallback => self.on_fallback_resolved(result),
        }
    }

    /// Earliest deadline among deferred tasks
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Run every deferred task due at or before `now`
    pub fn fire_due(&mut self, now: Instant) {
        for task in self.timers.take_due(now) {
            match task {
                Deferred::SkipUnplayable { generation } => self.on_skip_due(generation),
                Deferred::FallbackCooldown { generation } => {
                    if generation == self.generation {
                        debug!("Quality fallback re-armed");
                        self.fallback.reset();
                    }
                }
                Deferred::SleepTimerExpired => self.on_sleep_timer_expired(),
            }
        }
    }

    /// Feed a transport callback into the state machine
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if let TransportEvent::VolumeChange = event {
            self.on_volume_change();
            return;
        }
        if !self.session.accepts_transport_events() {
            debug!(?event, state = ?self.state, "Ignoring transport event");
            return;
        }

        match event {
            TransportEvent::LoadedMetadata { duration } => self.on_loaded_metadata(duration),
            TransportEvent::Play => self.on_transport_playing(false),
            TransportEvent::Playing => self.on_transport_playing(true),
            TransportEvent::Pause => self.on_transport_paused(),
            TransportEvent::TimeUpdate { position } => self.on_time_update(position),
            TransportEvent::Ended => self.on_ended(),
            TransportEvent::Error { message } => self.on_transport_error(message),
            TransportEvent::VolumeChange => {}
        }
    }

    // ===== Queries =====

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Event bus, for handing to other publishers
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Queue cursor
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// Track assigned to the transport
    pub fn current_track(&self) -> Option<&Arc<Track>> {
        self.session.track.as_ref()
    }

    /// Whether shuffle is on
    pub fn shuffle_active(&self) -> bool {
        self.queue.shuffle_active()
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.queue.repeat_mode()
    }

    /// User volume (0.0-1.0), independent of mute
    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    /// Whether output is muted
    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    /// Volume actually reaching the output
    pub fn effective_volume(&self) -> f32 {
        self.volume.effective()
    }

    /// Preferred stream quality
    pub fn quality(&self) -> QualityTier {
        self.quality
    }

    /// Tier of the URL currently in the transport
    pub fn load_quality(&self) -> Option<QualityTier> {
        self.session.track.as_ref().map(|_| self.session.load_quality)
    }

    /// Last known position in seconds
    pub fn position(&self) -> f64 {
        self.session.position
    }

    /// Duration of the loaded source
    pub fn duration(&self) -> Option<f64> {
        self.session.duration
    }

    /// Whether the player means to be playing
    pub fn wants_playing(&self) -> bool {
        self.session.wants_playing
    }

    /// Whether a quality fallback has been attempted for the current load
    pub fn is_fallback_retry(&self) -> bool {
        self.fallback.retry_in_flight()
    }

    /// Current load generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configuration in use
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Capture the state for UI consumption
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.state,
            current_index: self.queue.current_index(),
            track_id: self.session.track.as_ref().map(|t| t.id.clone()),
            queue_length: self.queue.len(),
            shuffle_active: self.queue.shuffle_active(),
            repeat_mode: self.queue.repeat_mode(),
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            quality: self.quality,
            position: self.session.position,
            duration: self.session.duration,
            sleep_timer_active: self.sleep_timer.is_active(),
            cast_state: self.cast_state,
        }
    }

    // ===== Internals =====

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.timers.retain_generation(self.generation);
        self.outbox.clear();
        self.fallback.reset();
    }

    fn reroll_up_next(&mut self) {
        self.up_next = if self.queue.shuffle_active() {
            order::next_index(&self.queue, &mut self.rng)
        } else {
            None
        };
    }

    fn upcoming_index(&self) -> Option<usize> {
        if self.queue.shuffle_active() {
            self.up_next
        } else {
            order::sequential_next(&self.queue)
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "State transition");
        self.state = state;
        self.events.emit(PlayerEvent::StateChanged { state });
        self.update_media_session_playback_state();
    }

    fn start_transport(&mut self) -> bool {
        match self.transport.play() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Transport refused to play");
                false
            }
        }
    }

    /// Play the freshly loaded source if that is the intent
    fn begin_playback(&mut self) {
        if !self.session.wants_playing {
            self.set_state(PlaybackState::Paused);
            return;
        }
        if !self.start_transport() {
            self.session.wants_playing = false;
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_load_resolved(&mut self, result: aurial_core::Result<Option<String>>) {
        if !self.session.awaiting_url {
            debug!("Ignoring stream URL nobody is waiting for");
            return;
        }
        self.session.awaiting_url = false;

        match result {
            Ok(Some(url)) => {
                debug!(url = %url, "Stream URL resolved");
                self.transport.load(&url);
                self.begin_playback();
            }
            Ok(None) => {
                warn!(tier = %self.session.load_quality, "No stream URL");
                self.recover_from_failure(SkipReason::NoStream);
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve stream URL");
                self.recover_from_failure(SkipReason::PlaybackFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn on_fallback_resolved(&mut self, result: aurial_core::Result<Option<String>>) {
        let Recovery::AwaitingFallback { tier } = self.session.recovery else {
            debug!("No quality fallback pending");
            return;
        };
        self.session.recovery = Recovery::Clear;

        match result {
            Ok(Some(url)) => {
                let resume_at = self.session.position;
                info!(%tier, position = resume_at, "Fallback stream ready");

                self.session.load_quality = tier;
                self.session.metadata_loaded = false;
                self.session.duration = None;
                self.session.pending_seek = (resume_at > 0.0).then_some(resume_at);

                self.transport.load(&url);
                self.set_state(PlaybackState::Loading);
                self.begin_playback();

                self.timers.schedule(
                    Instant::now() + self.fallback.cooldown(),
                    Deferred::FallbackCooldown {
                        generation: self.generation,
                    },
                );
            }
            Ok(None) => {
                warn!(%tier, "No stream URL at fallback quality");
                self.fallback.reset();
                self.skip_unplayable(SkipReason::NoStream);
            }
            Err(e) => {
                warn!(%tier, error = %e, "Fallback resolution failed");
                self.fallback.reset();
                self.skip_unplayable(SkipReason::PlaybackFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Try a quality fallback, otherwise skip
    fn recover_from_failure(&mut self, reason: SkipReason) {
        let Some(track) = self.session.track.clone() else {
            return;
        };

        match self.fallback.decide(&track, self.quality) {
            FallbackDecision::Retry(tier) => {
                info!(track_id = %track.id, %tier, "Retrying at lower quality");
                self.session.recovery = Recovery::AwaitingFallback { tier };
                self.set_state(PlaybackState::ErrorRecovering);
                self.events.emit(PlayerEvent::FallbackAttempted {
                    track_id: track.id.clone(),
                    tier,
                });
                self.outbox.push(ResolveRequest {
                    ticket: ResolveTicket {
                        generation: self.generation,
                        purpose: ResolvePurpose::Fallback,
                    },
                    track_id: track.id.clone(),
                    tier,
                });
            }
            FallbackDecision::GiveUp => self.skip_unplayable(reason),
        }
    }

    fn skip_unplayable(&mut self, reason: SkipReason) {
        let Some(track) = self.session.track.clone() else {
            return;
        };

        warn!(track_id = %track.id, ?reason, "Skipping unplayable track");
        self.session.recovery = Recovery::SkipScheduled;
        self.session.abandoned = true;
        self.set_state(PlaybackState::ErrorRecovering);
        self.events.emit(PlayerEvent::TrackSkipped {
            track_id: track.id.clone(),
            reason,
        });
        self.timers.schedule(
            Instant::now() + self.config.skip_delay(),
            Deferred::SkipUnplayable {
                generation: self.generation,
            },
        );
    }

    fn on_skip_due(&mut self, generation: u64) {
        if generation != self.generation || self.session.recovery != Recovery::SkipScheduled {
            debug!(generation, "Dropping stale skip");
            return;
        }
        self.session.recovery = Recovery::Clear;

        match self.upcoming_index() {
            Some(index) => self.play_at_index(index),
            None => self.finish_queue(),
        }
    }

    fn finish_queue(&mut self) {
        info!("Queue exhausted");
        self.session.wants_playing = false;
        self.session.recovery = Recovery::Clear;
        self.transport.pause();
        self.set_state(PlaybackState::Ended);
        self.events.emit(PlayerEvent::QueueExhausted);
    }

    fn on_sleep_timer_expired(&mut self) {
        self.sleep_timer.mark_fired();
        info!("Sleep timer fired");
        self.pause();
        self.events.emit(PlayerEvent::SleepTimerFired);
    }

    fn on_loaded_metadata(&mut self, duration: Option<f64>) {
        self.session.metadata_loaded = true;
        self.session.duration = duration
            .or_else(|| self.transport.duration())
            .filter(|d| d.is_finite() && *d > 0.0);

        if let Some(seek) = self.session.pending_seek.take() {
            let target = match self.session.duration {
                Some(duration) => seek.min(duration),
                None => seek,
            };
            debug!(position = target, "Applying pending seek");
            self.transport.seek(target);
            self.session.position = target;
        }
        self.update_media_session_position_state();
    }

    /// `play` fires as soon as playback is requested, `playing` once audio
    /// flows. A load only counts as playing on the latter.
    fn on_transport_playing(&mut self, audible: bool) {
        if self.state == PlaybackState::Loading && !audible {
            return;
        }
        if matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Paused | PlaybackState::Ended
        ) {
            self.session.wants_playing = true;
            self.set_state(PlaybackState::Playing);
            self.update_media_session_position_state();
        }
    }

    fn on_transport_paused(&mut self) {
        if self.state == PlaybackState::Playing {
            self.session.wants_playing = false;
            self.set_state(PlaybackState::Paused);
            self.update_media_session_position_state();
        }
    }

    fn on_time_update(&mut self, position: f64) {
        if !position.is_finite() {
            return;
        }
        self.session.position = position;

        if !self.session.history_logged && position >= self.config.history_threshold_secs {
            self.session.history_logged = true;
            if let Some(track) = &self.session.track {
                debug!(track_id = %track.id, "Play counts for history");
                self.events.emit(PlayerEvent::PlayLogged {
                    track_id: track.id.clone(),
                });
            }
        }

        self.events.emit(PlayerEvent::PositionChanged {
            position,
            duration: self.session.duration,
        });
    }

    fn on_ended(&mut self) {
        if self.state == PlaybackState::Ended {
            debug!("Queue already finished, ignoring ended");
            return;
        }
        if let Some(track) = &self.session.track {
            info!(track_id = %track.id, "Track ended");
        }

        if self.queue.repeat_mode() == RepeatMode::One && self.queue.current().is_some() {
            self.play_track_from_queue(None);
            return;
        }

        match self.upcoming_index() {
            Some(index) => self.play_at_index(index),
            None => self.finish_queue(),
        }
    }

    fn on_transport_error(&mut self, message: String) {
        if !matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        ) {
            debug!(state = ?self.state, error = %message, "Ignoring transport error");
            return;
        }

        warn!(
            error = %message,
            tier = %self.session.load_quality,
            "Playback error"
        );
        self.recover_from_failure(SkipReason::PlaybackFailed { message });
    }

    fn on_volume_change(&mut self) {
        let muted = self.transport.is_muted();
        if muted != self.volume.is_muted() {
            debug!(muted, "Mute changed on the transport");
            self.volume.set_muted(muted);
            Preferences::save_muted(self.preferences.as_mut(), muted);
            self.emit_volume();
        }
    }
}
