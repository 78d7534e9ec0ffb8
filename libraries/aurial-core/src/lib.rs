//! Aurial Core
//!
//! Platform-agnostic types and collaborator traits shared by the Aurial
//! playback engine and the surrounding browser client.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `AlbumRef`, `TrackId`, `QualityTier`
//! - **Collaborator Traits**: `QualityResolver`, `PreferenceStore`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use aurial_core::{QualityTier, Track};
//!
//! let track = Track::new("12345", "Song")
//!     .with_artists(["Artist"])
//!     .with_duration(212.0)
//!     .with_quality_tags(["HIRES_LOSSLESS"]);
//!
//! assert_eq!(track.derived_quality(), Some(QualityTier::HiResLossless));
//! assert_eq!(
//!     QualityTier::Lossless.effective_for(&track),
//!     QualityTier::Lossless
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{PreferenceStore, QualityResolver};
pub use types::{AlbumRef, QualityTier, Track, TrackId};
