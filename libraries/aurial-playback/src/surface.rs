//! External playback surfaces
//!
//! OS media session, hardware media keys and the cast bridge. The player
//! drives the media session and receives media keys; cast state is stored
//! for display only.

use aurial_core::Track;
use serde::{Deserialize, Serialize};

/// Square artwork sizes offered to the media session
pub const ARTWORK_SIZES: [u32; 3] = [96, 320, 640];

/// Artwork entry for the media session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// Image URL
    pub src: String,
    /// `WxH` size hint
    pub sizes: String,
}

/// Now-playing metadata pushed to the media session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Track title
    pub title: String,
    /// Artist line
    pub artist: String,
    /// Album title, empty when unknown
    pub album: String,
    /// Cover art in several sizes
    pub artwork: Vec<Artwork>,
    /// Track duration in seconds, when known
    pub duration: Option<f64>,
}

impl MediaMetadata {
    /// Metadata describing `track`
    pub fn from_track(track: &Track) -> Self {
        let artwork = ARTWORK_SIZES
            .iter()
            .filter_map(|&size| {
                track.artwork_url(size).map(|src| Artwork {
                    src,
                    sizes: format!("{}x{}", size, size),
                })
            })
            .collect();

        Self {
            title: track.title.clone(),
            artist: track.artist_line(),
            album: track
                .album
                .as_ref()
                .map(|album| album.title.clone())
                .unwrap_or_default(),
            artwork,
            duration: track.duration_seconds,
        }
    }
}

/// Playback state as the media session understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPlaybackState {
    /// Nothing loaded
    None,
    /// Playing
    Playing,
    /// Paused, ended or recovering
    Paused,
}

/// Position snapshot for the media session scrubber
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    /// Duration in seconds
    pub duration: f64,
    /// Position in seconds, never past `duration`
    pub position: f64,
    /// Playback rate
    pub playback_rate: f64,
}

/// OS media session mirror
#[cfg_attr(test, mockall::automock)]
pub trait MediaSurface: Send {
    /// Show now-playing metadata
    fn set_metadata(&mut self, metadata: &MediaMetadata);

    /// Remove now-playing metadata
    fn clear_metadata(&mut self);

    /// Mirror the playback state
    fn set_playback_state(&mut self, state: SessionPlaybackState);

    /// Mirror the scrubber position
    fn set_position_state(&mut self, position: PositionState);
}

/// Media session that discards everything, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSurface;

impl MediaSurface for NoopSurface {
    fn set_metadata(&mut self, _metadata: &MediaMetadata) {}

    fn clear_metadata(&mut self) {}

    fn set_playback_state(&mut self, _state: SessionPlaybackState) {}

    fn set_position_state(&mut self, _position: PositionState) {}
}

/// Hardware media key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKey {
    /// Next track
    Next,
    /// Previous track
    Previous,
    /// Toggle play/pause
    PlayPause,
    /// Stop: pause and rewind
    Stop,
}

/// Remote cast availability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CastState {
    /// No cast target found
    #[default]
    Unavailable,
    /// A target can be connected
    Available,
    /// Casting
    Connected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurial_core::AlbumRef;

    #[test]
    fn metadata_carries_artwork_in_every_size() {
        let track = Track::new("1", "Song")
            .with_artists(["A", "B"])
            .with_album(AlbumRef {
                id: "9".into(),
                title: "Record".into(),
                cover: Some("ab-cd".into()),
                ..Default::default()
            });

        let metadata = MediaMetadata::from_track(&track);
        assert_eq!(metadata.artist, "A, B");
        assert_eq!(metadata.album, "Record");
        assert_eq!(metadata.artwork.len(), ARTWORK_SIZES.len());
        assert_eq!(metadata.artwork[0].sizes, "96x96");
        assert!(metadata.artwork[0].src.ends_with("/ab/cd/96x96.jpg"));
    }

    #[test]
    fn metadata_without_album_has_no_artwork() {
        let metadata = MediaMetadata::from_track(&Track::new("1", "Song"));
        assert!(metadata.artwork.is_empty());
        assert!(metadata.album.is_empty());
    }
}
