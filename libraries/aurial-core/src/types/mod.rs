//! Domain types

mod ids;
mod quality;
mod track;

pub use ids::{TrackId, LOCAL_PREFIX, TRACKER_PREFIX};
pub use quality::QualityTier;
pub use track::{AlbumRef, Track};
