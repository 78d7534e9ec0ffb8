//! Async driver for the player
//!
//! `PlayerRuntime` owns the `Player` and is the single place where anything
//! reaches it: commands from `PlayerHandle`s, transport callbacks, resolver
//! answers and timer deadlines all funnel through one `select!` loop, so the
//! player only ever sees one input at a time.

use std::collections::HashMap;
use std::future;
use std::sync::Arc;

use aurial_core::{CoreError, QualityResolver, QualityTier, Track};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlayerEvent};
use crate::player::{Player, PlayerSnapshot, ResolveRequest};
use crate::shortcuts::Shortcut;
use crate::surface::{CastState, MediaKey};
use crate::transport::TransportEvent;
use crate::types::RepeatMode;

/// Commands buffered before senders wait
const COMMAND_CAPACITY: usize = 64;

type ResolveOutcome = aurial_core::Result<Option<String>>;

/// Command for the player runtime
#[derive(Debug)]
pub enum Command {
    /// Replace the queue
    SetQueue {
        /// New tracks
        tracks: Vec<Arc<Track>>,
        /// Cursor position, clamped
        start_index: usize,
    },
    /// Play the track under the cursor, optionally from a position
    PlayFromQueue {
        /// Seconds to start at
        seek: Option<f64>,
    },
    /// Play the track at an index
    PlayAtIndex(usize),
    /// Skip forward
    PlayNext,
    /// Skip back
    PlayPrev,
    /// Append tracks
    AddToQueue(Vec<Arc<Track>>),
    /// Insert tracks after the current one
    AddNextToQueue(Vec<Arc<Track>>),
    /// Flip shuffle
    ToggleShuffle(oneshot::Sender<bool>),
    /// Cycle repeat mode
    ToggleRepeat(oneshot::Sender<RepeatMode>),
    /// Toggle play/pause
    PlayPause,
    /// Seek to seconds
    SeekTo(f64),
    /// Seek to a fraction of the track
    SeekToFraction(f64),
    /// Set the user volume
    SetVolume(f32),
    /// Mute or unmute
    SetMuted(bool),
    /// Change preferred quality
    SetQuality(QualityTier),
    /// Arm the sleep timer
    SetSleepTimer {
        /// Minutes until pause
        minutes: f64,
        /// Rejection of invalid durations
        reply: oneshot::Sender<Result<()>>,
    },
    /// Disarm the sleep timer
    ClearSleepTimer,
    /// Hardware media key
    MediaKey(MediaKey),
    /// Keyboard shortcut
    Shortcut(Shortcut),
    /// Cast bridge state
    SetCastState(CastState),
    /// Read the player state
    Snapshot(oneshot::Sender<PlayerSnapshot>),
    /// Preview the next track
    NextTrack(oneshot::Sender<Option<Arc<Track>>>),
    /// Stop the runtime
    Shutdown,
}

/// Single dispatch loop around a `Player`
pub struct PlayerRuntime {
    player: Player,
    resolver: Arc<dyn QualityResolver>,
    commands: mpsc::Receiver<Command>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    transport_open: bool,
    resolving: JoinSet<ResolveOutcome>,
    // Every task in `resolving` has its request here until it is joined
    in_flight: HashMap<Id, ResolveRequest>,
}

impl PlayerRuntime {
    /// Wrap `player`, returning the runtime and a handle to drive it
    ///
    /// `transport_events` carries the transport's callbacks.
    pub fn new(
        player: Player,
        resolver: Arc<dyn QualityResolver>,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> (Self, PlayerHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = PlayerHandle {
            commands: tx,
            events: player.events().clone(),
        };

        let runtime = Self {
            player,
            resolver,
            commands: rx,
            transport_events,
            transport_open: true,
            resolving: JoinSet::new(),
            in_flight: HashMap::new(),
        };
        (runtime, handle)
    }

    /// Run until `Command::Shutdown` or every handle is dropped
    ///
    /// Returns the player so its final state can be inspected.
    pub async fn run(mut self) -> Player {
        info!("Player runtime started");

        loop {
            self.dispatch_resolve_requests();
            let deadline = self.player.next_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                event = self.transport_events.recv(), if self.transport_open => match event {
                    Some(event) => self.player.handle_transport_event(event),
                    None => {
                        warn!("Transport event channel closed");
                        self.transport_open = false;
                    }
                },
                Some(joined) = self.resolving.join_next_with_id(), if !self.resolving.is_empty() => {
                    self.finish_resolve(joined);
                },
                () = wait_until(deadline) => self.player.fire_due(Instant::now()),
            }
        }

        self.resolving.abort_all();
        self.in_flight.clear();
        info!("Player runtime stopped");
        self.player
    }

    fn dispatch_resolve_requests(&mut self) {
        let timeout = self.player.config().resolve_timeout();

        for request in self.player.take_resolve_requests() {
            debug!(
                track_id = %request.track_id,
                tier = %request.tier,
                purpose = ?request.ticket.purpose(),
                "Resolving stream URL"
            );
            let resolver = Arc::clone(&self.resolver);
            let track_id = request.track_id.clone();
            let tier = request.tier;

            let task = self.resolving.spawn(async move {
                time::timeout(timeout, resolver.resolve_stream_url(&track_id, tier))
                    .await
                    .unwrap_or_else(|_| Err(CoreError::resolve(&track_id, tier, "timed out")))
            });
            self.in_flight.insert(task.id(), request);
        }
    }

    /// Hand a joined resolver task's answer to the player
    ///
    /// A task that panicked or was cancelled still answers its ticket with
    /// an error, so the player can fall back or skip.
    fn finish_resolve(&mut self, joined: std::result::Result<(Id, ResolveOutcome), JoinError>) {
        let (id, result) = match joined {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Resolver task failed");
                let id = e.id();
                let Some(request) = self.in_flight.get(&id) else {
                    return;
                };
                let error = CoreError::resolve(&request.track_id, request.tier, e.to_string());
                (id, Err(error))
            }
        };

        let Some(request) = self.in_flight.remove(&id) else {
            warn!(%id, "Resolver answer for unknown task");
            return;
        };
        self.player.complete_resolve(request.ticket, result);
    }

    fn apply(&mut self, command: Command) {
        let player = &mut self.player;
        match command {
            Command::SetQueue {
                tracks,
                start_index,
            } => player.set_queue(tracks, start_index),
            Command::PlayFromQueue { seek } => player.play_track_from_queue(seek),
            Command::PlayAtIndex(index) => player.play_at_index(index),
            Command::PlayNext => player.play_next(),
            Command::PlayPrev => player.play_prev(),
            Command::AddToQueue(tracks) => {
                player.add_to_queue(tracks);
            }
            Command::AddNextToQueue(tracks) => {
                player.add_next_to_queue(tracks);
            }
            Command::ToggleShuffle(reply) => {
                let _ = reply.send(player.toggle_shuffle());
            }
            Command::ToggleRepeat(reply) => {
                let _ = reply.send(player.toggle_repeat());
            }
            Command::PlayPause => player.handle_play_pause(),
            Command::SeekTo(position) => player.seek_to(position),
            Command::SeekToFraction(fraction) => player.seek_to_fraction(fraction),
            Command::SetVolume(level) => {
                player.set_volume(level);
            }
            Command::SetMuted(muted) => player.set_muted(muted),
            Command::SetQuality(tier) => player.set_quality(tier),
            Command::SetSleepTimer { minutes, reply } => {
                let _ = reply.send(player.set_sleep_timer(minutes));
            }
            Command::ClearSleepTimer => player.clear_sleep_timer(),
            Command::MediaKey(key) => player.handle_media_key(key),
            Command::Shortcut(shortcut) => player.handle_shortcut(shortcut),
            Command::SetCastState(state) => player.set_cast_state(state),
            Command::Snapshot(reply) => {
                let _ = reply.send(player.snapshot());
            }
            Command::NextTrack(reply) => {
                let _ = reply.send(player.get_next_track().cloned());
            }
            Command::Shutdown => {}
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Cloneable front door to a running `PlayerRuntime`
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    events: EventBus,
}

impl PlayerHandle {
    /// Send a raw command
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::RuntimeClosed)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| PlaybackError::RuntimeClosed)
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Replace the queue
    pub async fn set_queue(&self, tracks: Vec<Arc<Track>>, start_index: usize) -> Result<()> {
        self.send(Command::SetQueue {
            tracks,
            start_index,
        })
        .await
    }

    /// Play the track under the cursor
    pub async fn play_track_from_queue(&self, seek: Option<f64>) -> Result<()> {
        self.send(Command::PlayFromQueue { seek }).await
    }

    /// Play the track at `index`
    pub async fn play_at_index(&self, index: usize) -> Result<()> {
        self.send(Command::PlayAtIndex(index)).await
    }

    /// Skip forward
    pub async fn play_next(&self) -> Result<()> {
        self.send(Command::PlayNext).await
    }

    /// Skip back
    pub async fn play_prev(&self) -> Result<()> {
        self.send(Command::PlayPrev).await
    }

    /// Append tracks
    pub async fn add_to_queue(&self, tracks: Vec<Arc<Track>>) -> Result<()> {
        self.send(Command::AddToQueue(tracks)).await
    }

    /// Insert tracks after the current one
    pub async fn add_next_to_queue(&self, tracks: Vec<Arc<Track>>) -> Result<()> {
        self.send(Command::AddNextToQueue(tracks)).await
    }

    /// Flip shuffle
    pub async fn toggle_shuffle(&self) -> Result<bool> {
        self.request(Command::ToggleShuffle).await
    }

    /// Cycle repeat mode
    pub async fn toggle_repeat(&self) -> Result<RepeatMode> {
        self.request(Command::ToggleRepeat).await
    }

    /// Toggle play/pause
    pub async fn play_pause(&self) -> Result<()> {
        self.send(Command::PlayPause).await
    }

    /// Seek to `position` seconds
    pub async fn seek_to(&self, position: f64) -> Result<()> {
        self.send(Command::SeekTo(position)).await
    }

    /// Seek to a fraction of the track
    pub async fn seek_to_fraction(&self, fraction: f64) -> Result<()> {
        self.send(Command::SeekToFraction(fraction)).await
    }

    /// Set the user volume
    pub async fn set_volume(&self, level: f32) -> Result<()> {
        self.send(Command::SetVolume(level)).await
    }

    /// Mute or unmute
    pub async fn set_muted(&self, muted: bool) -> Result<()> {
        self.send(Command::SetMuted(muted)).await
    }

    /// Change preferred quality
    pub async fn set_quality(&self, tier: QualityTier) -> Result<()> {
        self.send(Command::SetQuality(tier)).await
    }

    /// Arm the sleep timer
    pub async fn set_sleep_timer(&self, minutes: f64) -> Result<()> {
        self.request(|reply| Command::SetSleepTimer { minutes, reply })
            .await?
    }

    /// Disarm the sleep timer
    pub async fn clear_sleep_timer(&self) -> Result<()> {
        self.send(Command::ClearSleepTimer).await
    }

    /// Forward a hardware media key
    pub async fn media_key(&self, key: MediaKey) -> Result<()> {
        self.send(Command::MediaKey(key)).await
    }

    /// Forward a keyboard shortcut
    pub async fn shortcut(&self, shortcut: Shortcut) -> Result<()> {
        self.send(Command::Shortcut(shortcut)).await
    }

    /// Report the cast bridge's state
    pub async fn set_cast_state(&self, state: CastState) -> Result<()> {
        self.send(Command::SetCastState(state)).await
    }

    /// Read the player state
    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Preview the next track
    pub async fn next_track(&self) -> Result<Option<Arc<Track>>> {
        self.request(Command::NextTrack).await
    }

    /// Stop the runtime
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}
