//! Sleep timer
//!
//! At most one timer is armed. Re-arming replaces the previous deadline; the
//! scheduler key is the only cancellation handle.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{PlaybackError, Result};
use crate::timers::{Deferred, TimerKey, Timers};

#[derive(Debug, Clone, Copy)]
struct Armed {
    key: TimerKey,
    deadline: Instant,
    minutes: f64,
}

/// Sleep timer state
#[derive(Debug, Default)]
pub struct SleepTimer {
    armed: Option<Armed>,
}

impl SleepTimer {
    /// Create a disarmed timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `minutes` after `now`
    ///
    /// Replaces any armed timer. Zero, negative or non-finite durations are
    /// rejected and leave the current state untouched.
    pub fn arm(&mut self, minutes: f64, now: Instant, timers: &mut Timers) -> Result<Instant> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(PlaybackError::InvalidSleepDuration(minutes));
        }
        let delay = Duration::try_from_secs_f64(minutes * 60.0)
            .map_err(|_| PlaybackError::InvalidSleepDuration(minutes))?;
        let deadline = now
            .checked_add(delay)
            .ok_or(PlaybackError::InvalidSleepDuration(minutes))?;

        self.clear(timers);
        let key = timers.schedule(deadline, Deferred::SleepTimerExpired);
        self.armed = Some(Armed {
            key,
            deadline,
            minutes,
        });
        Ok(deadline)
    }

    /// Cancel the timer, returning whether one was armed
    pub fn clear(&mut self, timers: &mut Timers) -> bool {
        match self.armed.take() {
            Some(armed) => {
                timers.cancel(armed.key);
                true
            }
            None => false,
        }
    }

    /// Forget the armed state after the scheduler handed out the expiry
    pub fn mark_fired(&mut self) {
        self.armed = None;
    }

    /// Whether a timer is armed
    pub fn is_active(&self) -> bool {
        self.armed.is_some()
    }

    /// Deadline of the armed timer
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    /// Minutes the armed timer was set for
    pub fn minutes(&self) -> Option<f64> {
        self.armed.map(|armed| armed.minutes)
    }

    /// Time left before the timer fires, zero once overdue
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.armed
            .map(|armed| armed.deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearming_keeps_a_single_timer() {
        let now = Instant::now();
        let mut timers = Timers::new();
        let mut sleep = SleepTimer::new();

        sleep.arm(10.0, now, &mut timers).unwrap();
        let deadline = sleep.arm(5.0, now, &mut timers).unwrap();

        assert_eq!(timers.len(), 1);
        assert_eq!(deadline, now + Duration::from_secs(300));
        assert_eq!(sleep.remaining(now), Some(Duration::from_secs(300)));
        assert_eq!(sleep.minutes(), Some(5.0));
    }

    #[test]
    fn invalid_durations_are_rejected_without_side_effects() {
        let now = Instant::now();
        let mut timers = Timers::new();
        let mut sleep = SleepTimer::new();
        sleep.arm(1.0, now, &mut timers).unwrap();

        for minutes in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sleep.arm(minutes, now, &mut timers),
                Err(PlaybackError::InvalidSleepDuration(_))
            ));
        }

        assert!(sleep.is_active());
        assert_eq!(sleep.minutes(), Some(1.0));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn clear_cancels_the_scheduled_expiry() {
        let now = Instant::now();
        let mut timers = Timers::new();
        let mut sleep = SleepTimer::new();
        sleep.arm(0.5, now, &mut timers).unwrap();

        assert!(sleep.clear(&mut timers));
        assert!(!sleep.clear(&mut timers));
        assert!(timers.is_empty());
        assert!(!sleep.is_active());
    }
}
