//! Stream quality tiers

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Track;

/// Stream quality tier
///
/// Ordered from lowest to highest so that `Ord` matches the catalog
/// ordering `HI_RES_LOSSLESS > LOSSLESS > HIGH > LOW`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    /// Lossy, low bitrate
    Low,

    /// Lossy, high bitrate
    High,

    /// CD quality lossless
    Lossless,

    /// Hi-res lossless masters
    #[default]
    HiResLossless,
}

/// Aliases seen in catalog metadata, after token sanitizing
const TOKEN_ALIASES: &[(&str, QualityTier)] = &[
    ("HI_RES_LOSSLESS", QualityTier::HiResLossless),
    ("HIRES_LOSSLESS", QualityTier::HiResLossless),
    ("HIRESLOSSLESS", QualityTier::HiResLossless),
    ("HIFI_PLUS", QualityTier::HiResLossless),
    ("HI_RES_FLAC", QualityTier::HiResLossless),
    ("HI_RES", QualityTier::HiResLossless),
    ("HIRES", QualityTier::HiResLossless),
    ("MASTER", QualityTier::HiResLossless),
    ("MASTER_QUALITY", QualityTier::HiResLossless),
    ("MQA", QualityTier::HiResLossless),
    ("LOSSLESS", QualityTier::Lossless),
    ("HIFI", QualityTier::Lossless),
    ("HIGH", QualityTier::High),
    ("HIGH_QUALITY", QualityTier::High),
    ("LOW", QualityTier::Low),
    ("LOW_QUALITY", QualityTier::Low),
];

impl QualityTier {
    /// The tier the quality fallback starts from
    pub const TOP: QualityTier = QualityTier::HiResLossless;

    /// All tiers, best first
    pub const PRIORITY: [QualityTier; 4] = [
        QualityTier::HiResLossless,
        QualityTier::Lossless,
        QualityTier::High,
        QualityTier::Low,
    ];

    /// Next lower tier, or `None` at the bottom
    pub fn downgrade(self) -> Option<QualityTier> {
        match self {
            QualityTier::HiResLossless => Some(QualityTier::Lossless),
            QualityTier::Lossless => Some(QualityTier::High),
            QualityTier::High => Some(QualityTier::Low),
            QualityTier::Low => None,
        }
    }

    /// Whether this is the top tier
    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    /// Wire name (`HI_RES_LOSSLESS`, `LOSSLESS`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::HiResLossless => "HI_RES_LOSSLESS",
            QualityTier::Lossless => "LOSSLESS",
            QualityTier::High => "HIGH",
            QualityTier::Low => "LOW",
        }
    }

    /// Normalize a free-form quality token (`"Hi-Res"`, `"hifi plus"`, `"MQA"`)
    ///
    /// The token is upper-cased and every run of non-alphanumeric characters
    /// is folded into a single `_` before the alias lookup.
    pub fn from_token(token: &str) -> Option<QualityTier> {
        let sanitized = sanitize_token(token);
        if sanitized.is_empty() {
            return None;
        }

        TOKEN_ALIASES
            .iter()
            .find(|(alias, _)| *alias == sanitized)
            .map(|(_, tier)| *tier)
    }

    /// Best tier named by a set of tags, ignoring unknown tokens
    pub fn best_of<'a, I>(tags: I) -> Option<QualityTier>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tags.into_iter().filter_map(Self::from_token).max()
    }

    /// The tier to request for `track` when the user asked for `self`
    ///
    /// Tracks that advertise their encodings never get a URL request above
    /// what they carry; tracks without tags are requested as asked.
    pub fn effective_for(self, track: &Track) -> QualityTier {
        match track.derived_quality() {
            Some(available) => self.min(available),
            None => self,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn sanitize_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut pending_separator = false;

    for ch in token.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
    }

    if pending_separator && !out.is_empty() {
        out.push('_');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_catalog_priority() {
        assert!(QualityTier::HiResLossless > QualityTier::Lossless);
        assert!(QualityTier::Lossless > QualityTier::High);
        assert!(QualityTier::High > QualityTier::Low);

        let mut sorted = QualityTier::PRIORITY.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, QualityTier::PRIORITY.to_vec());
    }

    #[test]
    fn downgrade_walks_one_step() {
        assert_eq!(QualityTier::TOP.downgrade(), Some(QualityTier::Lossless));
        assert_eq!(QualityTier::Low.downgrade(), None);
    }

    #[test]
    fn tokens_are_normalized() {
        assert_eq!(
            QualityTier::from_token("hi-res lossless"),
            Some(QualityTier::HiResLossless)
        );
        assert_eq!(
            QualityTier::from_token(" HiFi Plus "),
            Some(QualityTier::HiResLossless)
        );
        assert_eq!(QualityTier::from_token("hifi"), Some(QualityTier::Lossless));
        assert_eq!(QualityTier::from_token("mqa"), Some(QualityTier::HiResLossless));
        assert_eq!(
            QualityTier::from_token("high_quality"),
            Some(QualityTier::High)
        );
        assert_eq!(QualityTier::from_token("DOLBY_ATMOS"), None);
        assert_eq!(QualityTier::from_token("  "), None);
    }

    #[test]
    fn best_of_prefers_highest_tier() {
        let tags = ["LOW", "LOSSLESS", "DOLBY_ATMOS"];
        assert_eq!(QualityTier::best_of(tags), Some(QualityTier::Lossless));
        assert_eq!(QualityTier::best_of(Vec::<&str>::new()), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&QualityTier::HiResLossless).unwrap();
        assert_eq!(json, "\"HI_RES_LOSSLESS\"");

        let tier: QualityTier = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(tier, QualityTier::High);
    }
}
