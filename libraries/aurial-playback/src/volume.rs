//! Volume and mute state
//!
//! The user volume survives muting: muting only zeroes the effective output,
//! never the stored level.

/// Volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// User volume (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

/// Volume used when nothing was persisted yet
pub const DEFAULT_VOLUME: f32 = 0.7;

impl Volume {
    /// Create new volume controller
    pub fn new(level: f32, muted: bool) -> Self {
        Self {
            level: clamp_level(level),
            muted,
        }
    }

    /// Set volume level, clamped to 0.0-1.0
    ///
    /// Returns the stored value. Non-finite input leaves the level alone.
    pub fn set_level(&mut self, level: f32) -> f32 {
        if level.is_finite() {
            self.level = clamp_level(level);
        }
        self.level
    }

    /// Current user volume (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set mute state
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Toggle mute state, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// What actually reaches the output
    ///
    /// Returns 0.0 if muted, otherwise the user volume
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME, false)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        DEFAULT_VOLUME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::default();
        assert_eq!(vol.level(), 0.7);
        assert!(!vol.is_muted());
    }

    #[test]
    fn set_volume_level_clamps() {
        let mut vol = Volume::new(0.5, false);
        assert_eq!(vol.set_level(0.75), 0.75);
        assert_eq!(vol.set_level(1.5), 1.0);
        assert_eq!(vol.set_level(-0.2), 0.0);
    }

    #[test]
    fn non_finite_level_is_ignored() {
        let mut vol = Volume::new(0.4, false);
        assert_eq!(vol.set_level(f32::NAN), 0.4);
        assert_eq!(Volume::new(f32::INFINITY, false).level(), DEFAULT_VOLUME);
    }

    #[test]
    fn mute_preserves_level() {
        let mut vol = Volume::new(0.35, false);
        vol.set_muted(true);
        assert!(vol.is_muted());
        assert_eq!(vol.level(), 0.35);
        assert_eq!(vol.effective(), 0.0);

        assert!(!vol.toggle_mute());
        assert_eq!(vol.effective(), 0.35);
    }
}
