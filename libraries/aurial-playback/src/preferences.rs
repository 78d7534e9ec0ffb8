//! Persisted listener preferences
//!
//! Volume, mute and preferred quality live in an opaque key/value store
//! (`localStorage` in the browser). Values are JSON-encoded. Corrupt or
//! missing entries fall back to defaults instead of failing construction.

use std::collections::HashMap;

use aurial_core::{PreferenceStore, QualityTier};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::volume::DEFAULT_VOLUME;

/// Store key for the user volume
pub const VOLUME_KEY: &str = "volume";

/// Store key for the mute flag
pub const MUTED_KEY: &str = "muted";

/// Store key for the preferred stream quality
pub const QUALITY_KEY: &str = "playback-quality";

/// Preferences read at start-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    /// User volume (0.0-1.0)
    pub volume: f32,
    /// Whether output starts muted
    pub muted: bool,
    /// Preferred stream quality
    pub quality: QualityTier,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            muted: false,
            quality: QualityTier::TOP,
        }
    }
}

impl Preferences {
    /// Read preferences, using defaults for anything missing or unreadable
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();

        // Quality used to be stored as a bare token, so accept that too
        let quality = read::<QualityTier>(store, QUALITY_KEY).or_else(|| {
            store
                .get(QUALITY_KEY)
                .and_then(|raw| QualityTier::from_token(&raw))
        });

        Self {
            volume: read(store, VOLUME_KEY)
                .filter(|volume: &f32| volume.is_finite())
                .map(|volume| volume.clamp(0.0, 1.0))
                .unwrap_or(defaults.volume),
            muted: read(store, MUTED_KEY).unwrap_or(defaults.muted),
            quality: quality.unwrap_or(defaults.quality),
        }
    }

    /// Persist the user volume
    pub fn save_volume(store: &mut dyn PreferenceStore, volume: f32) {
        write(store, VOLUME_KEY, &volume);
    }

    /// Persist the mute flag
    pub fn save_muted(store: &mut dyn PreferenceStore, muted: bool) {
        write(store, MUTED_KEY, &muted);
    }

    /// Persist the preferred quality
    pub fn save_quality(store: &mut dyn PreferenceStore, quality: QualityTier) {
        write(store, QUALITY_KEY, &quality);
    }
}

fn read<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable preference");
            None
        }
    }
}

fn write<T: Serialize>(store: &mut dyn PreferenceStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(encoded) => store.set(key, encoded),
        Err(e) => warn!(key, error = %e, "Failed to encode preference"),
    }
}

/// In-memory preference store
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl MemoryPreferenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, for inspection
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(Preferences::load(&store), Preferences::default());
    }

    #[test]
    fn saved_values_round_trip() {
        let mut store = MemoryPreferenceStore::new();
        Preferences::save_volume(&mut store, 0.35);
        Preferences::save_muted(&mut store, true);
        Preferences::save_quality(&mut store, QualityTier::High);

        assert_eq!(store.raw(MUTED_KEY), Some("true"));
        assert_eq!(store.raw(QUALITY_KEY), Some("\"HIGH\""));

        let prefs = Preferences::load(&store);
        assert_eq!(prefs.volume, 0.35);
        assert!(prefs.muted);
        assert_eq!(prefs.quality, QualityTier::High);
    }

    #[test]
    fn bare_quality_token_is_accepted() {
        let mut store = MemoryPreferenceStore::new();
        store.set(QUALITY_KEY, "LOSSLESS".to_string());
        assert_eq!(Preferences::load(&store).quality, QualityTier::Lossless);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let mut store = MemoryPreferenceStore::new();
        store.set(VOLUME_KEY, "loud".to_string());
        store.set(MUTED_KEY, "maybe".to_string());
        store.set(QUALITY_KEY, "ultra".to_string());

        assert_eq!(Preferences::load(&store), Preferences::default());
    }

    #[test]
    fn out_of_range_volume_is_clamped() {
        let mut store = MemoryPreferenceStore::new();
        store.set(VOLUME_KEY, "3.5".to_string());
        assert_eq!(Preferences::load(&store).volume, 1.0);
    }
}
