//! Player configuration
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides (`AURIAL_SKIP_DELAY_MS=500`)
pub const ENV_PREFIX: &str = "AURIAL";

/// Tunables for the playback engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Delay before a successful quality fallback may trigger again
    #[serde(default = "default_fallback_cooldown_ms")]
    pub fallback_cooldown_ms: u64,

    /// Delay before moving past an unplayable track
    #[serde(default = "default_skip_delay_ms")]
    pub skip_delay_ms: u64,

    /// Past this position "previous" restarts the current track
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,

    /// Longest wait for a stream URL before the load counts as failed
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Listening time after which a play counts for history
    #[serde(default = "default_history_threshold_secs")]
    pub history_threshold_secs: f64,

    /// Step for the seek shortcuts
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// Step for the volume shortcuts
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,

    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Fixed seed for shuffle, for reproducible runs
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl PlaybackConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables prefixed with `AURIAL_` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings =
            settings.add_source(config::Environment::with_prefix(prefix).try_parsing(true));

        let config: PlaybackConfig = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(PlaybackError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }

        if self.resolve_timeout_ms == 0 {
            return Err(PlaybackError::Config(
                "resolve_timeout_ms must be at least 1".to_string(),
            ));
        }

        if !(self.volume_step > 0.0 && self.volume_step <= 1.0) {
            return Err(PlaybackError::Config(format!(
                "volume_step must be in (0, 1], got {}",
                self.volume_step
            )));
        }

        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            return Err(PlaybackError::Config(format!(
                "seek_step_secs must be positive, got {}",
                self.seek_step_secs
            )));
        }

        if !self.history_threshold_secs.is_finite() || self.history_threshold_secs < 0.0 {
            return Err(PlaybackError::Config(format!(
                "history_threshold_secs must not be negative, got {}",
                self.history_threshold_secs
            )));
        }

        Ok(())
    }

    /// Fallback cooldown as a `Duration`
    pub fn fallback_cooldown(&self) -> Duration {
        Duration::from_millis(self.fallback_cooldown_ms)
    }

    /// Skip delay as a `Duration`
    pub fn skip_delay(&self) -> Duration {
        Duration::from_millis(self.skip_delay_ms)
    }

    /// Resolve timeout as a `Duration`
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Restart threshold in seconds
    pub fn restart_threshold_secs(&self) -> f64 {
        Duration::from_millis(self.restart_threshold_ms).as_secs_f64()
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fallback_cooldown_ms: default_fallback_cooldown_ms(),
            skip_delay_ms: default_skip_delay_ms(),
            restart_threshold_ms: default_restart_threshold_ms(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            history_threshold_secs: default_history_threshold_secs(),
            seek_step_secs: default_seek_step_secs(),
            volume_step: default_volume_step(),
            event_capacity: default_event_capacity(),
            shuffle_seed: None,
        }
    }
}

// Default values
fn default_fallback_cooldown_ms() -> u64 {
    5000
}

fn default_skip_delay_ms() -> u64 {
    1000
}

fn default_restart_threshold_ms() -> u64 {
    3000
}

fn default_resolve_timeout_ms() -> u64 {
    15_000
}

fn default_history_threshold_secs() -> f64 {
    10.0
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_volume_step() -> f32 {
    0.1
}

fn default_event_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = PlaybackConfig::default();
        assert_eq!(config.fallback_cooldown(), Duration::from_secs(5));
        assert_eq!(config.skip_delay(), Duration::from_secs(1));
        assert_eq!(config.restart_threshold_secs(), 3.0);
        assert_eq!(config.resolve_timeout(), Duration::from_secs(15));
        assert_eq!(config.event_capacity, 256);
        assert!(config.shuffle_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "skip_delay_ms = 250").unwrap();
        writeln!(file, "shuffle_seed = 99").unwrap();

        let config =
            PlaybackConfig::load_with_prefix(Some(file.path()), "AURIAL_TEST_FILE").unwrap();
        assert_eq!(config.skip_delay_ms, 250);
        assert_eq!(config.shuffle_seed, Some(99));
        assert_eq!(config.fallback_cooldown_ms, 5000);
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "fallback_cooldown_ms = 8000").unwrap();

        std::env::set_var("AURIAL_TEST_ENV_FALLBACK_COOLDOWN_MS", "1200");
        let config =
            PlaybackConfig::load_with_prefix(Some(file.path()), "AURIAL_TEST_ENV").unwrap();
        std::env::remove_var("AURIAL_TEST_ENV_FALLBACK_COOLDOWN_MS");

        assert_eq!(config.fallback_cooldown_ms, 1200);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = PlaybackConfig {
            event_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));

        let config = PlaybackConfig {
            volume_step: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            resolve_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = PlaybackConfig::load_with_prefix(
            Some(Path::new("/nonexistent/aurial.toml")),
            "AURIAL_TEST_MISSING",
        );
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }
}
