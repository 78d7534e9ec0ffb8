//! ID types for Aurial entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by ids of tracks that live in the user's local files
pub const LOCAL_PREFIX: &str = "local-";

/// Prefix carried by ids of unreleased tracker items
pub const TRACKER_PREFIX: &str = "tracker-";

/// Track identifier
///
/// Unique within a provider namespace. Ids may carry a provider prefix
/// (`local-`, `tracker-`) which the engine treats as a hint about where the
/// stream comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id carries the tracker prefix
    pub fn has_tracker_prefix(&self) -> bool {
        self.0.starts_with(TRACKER_PREFIX)
    }

    /// Whether the id carries the local-files prefix
    pub fn has_local_prefix(&self) -> bool {
        self.0.starts_with(LOCAL_PREFIX)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_detected() {
        assert!(TrackId::new("tracker-abc").has_tracker_prefix());
        assert!(TrackId::new("local-3f2a").has_local_prefix());
        assert!(!TrackId::new("1234").has_tracker_prefix());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&TrackId::new("77")).unwrap();
        assert_eq!(json, "\"77\"");
    }
}
