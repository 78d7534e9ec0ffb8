//! Track domain type
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{QualityTier, TrackId};

/// Base URL for catalog cover art
const ARTWORK_BASE_URL: &str = "https://resources.tidal.com/images";

/// Album reference carried by a track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRef {
    /// Album identifier
    pub id: String,

    /// Album title
    pub title: String,

    /// Cover art identifier (dash separated uuid)
    #[serde(default)]
    pub cover: Option<String>,

    /// Release date as provided by the catalog
    #[serde(default)]
    pub release_date: Option<String>,

    /// Encodings the album advertises
    #[serde(default)]
    pub quality_tags: BTreeSet<String>,
}

/// Playable item
///
/// Immutable value shared between the player, the UI and storage. The player
/// never owns a track exclusively; queues hold `Arc<Track>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stable identifier, possibly provider prefixed
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist names, main artist first
    #[serde(default)]
    pub artists: Vec<String>,

    /// Duration in seconds, unknown for some unavailable/tracker items
    #[serde(default)]
    pub duration_seconds: Option<f64>,

    /// Album the track belongs to
    #[serde(default)]
    pub album: Option<AlbumRef>,

    /// Encodings available for this track
    #[serde(default)]
    pub quality_tags: BTreeSet<String>,

    /// Track lives in the user's local files
    #[serde(default)]
    pub is_local: bool,

    /// Unreleased item from a community tracker sheet
    #[serde(default)]
    pub is_tracker: bool,

    /// Catalog marks the track as not streamable
    #[serde(default)]
    pub is_unavailable: bool,

    /// Mix type to mix id, passed through untouched
    #[serde(default)]
    pub mixes: BTreeMap<String, String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            duration_seconds: None,
            album: None,
            quality_tags: BTreeSet::new(),
            is_local: false,
            is_tracker: false,
            is_unavailable: false,
            mixes: BTreeMap::new(),
        }
    }

    /// Set the artist names
    #[must_use]
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    /// Set the duration in seconds
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Set the album reference
    #[must_use]
    pub fn with_album(mut self, album: AlbumRef) -> Self {
        self.album = Some(album);
        self
    }

    /// Set the advertised encodings
    #[must_use]
    pub fn with_quality_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quality_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as a local file
    #[must_use]
    pub fn local(mut self) -> Self {
        self.is_local = true;
        self
    }

    /// Mark as a tracker item
    #[must_use]
    pub fn tracker(mut self) -> Self {
        self.is_tracker = true;
        self
    }

    /// Mark as unavailable
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.is_unavailable = true;
        self
    }

    /// Tracker items are flagged explicitly or recognised by id prefix
    pub fn is_tracker_item(&self) -> bool {
        self.is_tracker || self.id.has_tracker_prefix()
    }

    /// Whether the stream comes from somewhere the catalog's quality tiers
    /// do not apply (local files, tracker items)
    pub fn bypasses_catalog(&self) -> bool {
        self.is_local || self.is_tracker_item()
    }

    /// Best tier advertised by the track, falling back to its album's tags
    pub fn derived_quality(&self) -> Option<QualityTier> {
        let own = QualityTier::best_of(self.quality_tags.iter().map(String::as_str));
        let album = self
            .album
            .as_ref()
            .and_then(|album| QualityTier::best_of(album.quality_tags.iter().map(String::as_str)));

        own.max(album)
    }

    /// Artist names joined for display surfaces
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }

    /// Cover art URL at the given square size, if the album has a cover
    pub fn artwork_url(&self, size: u32) -> Option<String> {
        let cover = self.album.as_ref()?.cover.as_deref()?;
        if cover.is_empty() {
            return None;
        }

        Some(format!(
            "{}/{}/{}x{}.jpg",
            ARTWORK_BASE_URL,
            cover.replace('-', "/"),
            size,
            size
        ))
    }
}
