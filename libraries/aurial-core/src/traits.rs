//! Collaborator traits consumed by the playback engine
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{QualityTier, TrackId};

/// Stream URL resolver
///
/// Owned by the API collaborator. The engine only calls it: once per track
/// load at the effective tier, and at most once more per load when the
/// quality fallback kicks in.
#[async_trait]
pub trait QualityResolver: Send + Sync {
    /// Resolve a streamable URL for `track_id` at `tier`
    ///
    /// `Ok(None)` means the catalog has no stream at that tier; the engine
    /// treats it like a failure.
    async fn resolve_stream_url(&self, track_id: &TrackId, tier: QualityTier)
        -> Result<Option<String>>;
}

/// Opaque key/value persistence (the browser's local storage)
///
/// Reads happen once at startup, writes are fire-and-forget.
pub trait PreferenceStore: Send {
    /// Read a raw value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a raw value
    fn set(&mut self, key: &str, value: String);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed;

    #[async_trait]
    impl QualityResolver for Fixed {
        async fn resolve_stream_url(
            &self,
            track_id: &TrackId,
            tier: QualityTier,
        ) -> Result<Option<String>> {
            Ok(Some(format!("https://cdn.test/{}/{}", track_id, tier)))
        }
    }

    #[tokio::test]
    async fn resolver_is_object_safe() {
        let resolver: Box<dyn QualityResolver> = Box::new(Fixed);
        let url = resolver
            .resolve_stream_url(&TrackId::new("9"), QualityTier::Lossless)
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.test/9/LOSSLESS"));
    }

    #[test]
    fn preference_store_is_object_safe() {
        struct Map(HashMap<String, String>);

        impl PreferenceStore for Map {
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key).cloned()
            }

            fn set(&mut self, key: &str, value: String) {
                self.0.insert(key.to_string(), value);
            }
        }

        let mut store: Box<dyn PreferenceStore> = Box::new(Map(HashMap::new()));
        store.set("volume", "0.5".to_string());
        assert_eq!(store.get("volume").as_deref(), Some("0.5"));
    }
}
