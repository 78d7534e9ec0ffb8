//! Play queue
//!
//! Canonical (unshuffled) track order plus the cursor and the play-order
//! flags. Shuffle never reorders `tracks`; it only changes how the next
//! index is picked (see `order`).

use std::sync::Arc;

use aurial_core::Track;
use tracing::debug;

use crate::types::RepeatMode;

/// Play queue owned by the player
///
/// Invariant: `current_index` is `Some` and in range whenever `tracks` is
/// non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Tracks in canonical order
    tracks: Vec<Arc<Track>>,

    /// Cursor into `tracks`
    current_index: Option<usize>,

    /// Whether next/previous pick at random
    shuffle_active: bool,

    /// Repeat policy
    repeat_mode: RepeatMode,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale
    ///
    /// `start_index` is clamped into range. An empty `tracks` clears the
    /// queue. Shuffle and repeat flags are kept.
    pub fn replace(&mut self, tracks: Vec<Arc<Track>>, start_index: usize) {
        self.current_index = if tracks.is_empty() {
            None
        } else {
            Some(start_index.min(tracks.len() - 1))
        };
        self.tracks = tracks;
    }

    /// Append tracks to the end
    ///
    /// Unavailable tracks are dropped. Returns how many tracks were added.
    pub fn append<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = Arc<Track>>,
    {
        let before = self.tracks.len();
        self.tracks.extend(tracks.into_iter().filter(accept_for_playback));
        let added = self.tracks.len() - before;

        if added > 0 && self.current_index.is_none() {
            self.current_index = Some(0);
        }

        added
    }

    /// Insert tracks immediately after the current track
    ///
    /// The current index is untouched because insertion always happens
    /// after it. Returns how many tracks were inserted.
    pub fn insert_next<I>(&mut self, tracks: I) -> usize
    where
        I: IntoIterator<Item = Arc<Track>>,
    {
        let incoming: Vec<Arc<Track>> = tracks.into_iter().filter(accept_for_playback).collect();
        if incoming.is_empty() {
            return 0;
        }

        let added = incoming.len();
        match self.current_index {
            Some(current) => {
                let at = current + 1;
                self.tracks.splice(at..at, incoming);
            }
            None => {
                self.tracks = incoming;
                self.current_index = Some(0);
            }
        }

        added
    }

    /// Move the cursor
    ///
    /// Returns false (and leaves the cursor alone) for out-of-range indices.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current_index = Some(index);
            true
        } else {
            false
        }
    }

    /// Cursor position
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Arc<Track>> {
        self.current_index.and_then(|index| self.tracks.get(index))
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    /// Read-only view of all tracks in canonical order
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether shuffle is on
    pub fn shuffle_active(&self) -> bool {
        self.shuffle_active
    }

    /// Turn shuffle on or off
    pub fn set_shuffle(&mut self, active: bool) {
        self.shuffle_active = active;
    }

    /// Current repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Change the repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }
}

fn accept_for_playback(track: &Arc<Track>) -> bool {
    if track.is_unavailable {
        debug!(track_id = %track.id, "Not enqueueing unavailable track");
        return false;
    }
    true
}
