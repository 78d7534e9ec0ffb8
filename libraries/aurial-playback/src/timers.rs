//! Deferred continuations
//!
//! The player never blocks. Anything that has to happen later (skipping an
//! unplayable track, re-arming the quality fallback, the sleep timer) is
//! recorded here with a deadline and re-enters the player through
//! `Player::fire_due`.

use tokio::time::Instant;

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey(u64);

/// Work the player defers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Move past a track that could not be played
    SkipUnplayable {
        /// Load the skip belongs to
        generation: u64,
    },

    /// Allow another quality fallback for the same load
    FallbackCooldown {
        /// Load the cooldown belongs to
        generation: u64,
    },

    /// Sleep timer ran out
    SleepTimerExpired,
}

impl Deferred {
    /// The load this task is tied to, if any
    ///
    /// Tasks without a generation survive navigation.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Deferred::SkipUnplayable { generation } | Deferred::FallbackCooldown { generation } => {
                Some(*generation)
            }
            Deferred::SleepTimerExpired => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: TimerKey,
    due: Instant,
    task: Deferred,
}

/// Pending deferred tasks ordered by deadline
#[derive(Debug, Default)]
pub struct Timers {
    entries: Vec<Entry>,
    next_key: u64,
}

impl Timers {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` for `due`
    pub fn schedule(&mut self, due: Instant, task: Deferred) -> TimerKey {
        let key = TimerKey(self.next_key);
        self.next_key += 1;
        self.entries.push(Entry { key, due, task });
        key
    }

    /// Cancel a scheduled task, returning whether it was still pending
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.entries.len() != before
    }

    /// Drop every load-bound task that does not belong to `generation`
    pub fn retain_generation(&mut self, generation: u64) {
        self.entries
            .retain(|entry| !matches!(entry.task.generation(), Some(g) if g != generation));
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.due).min()
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due: Vec<Entry> = Vec::new();
        let mut pending = Vec::with_capacity(self.entries.len());

        for entry in self.entries.drain(..) {
            if entry.due <= now {
                due.push(entry);
            } else {
                pending.push(entry);
            }
        }
        self.entries = pending;

        due.sort_by_key(|entry| (entry.due, entry.key.0));
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Whether `task` is pending
    pub fn contains(&self, task: Deferred) -> bool {
        self.entries.iter().any(|entry| entry.task == task)
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(now + Duration::from_secs(5), Deferred::SleepTimerExpired);
        timers.schedule(
            now + Duration::from_secs(1),
            Deferred::SkipUnplayable { generation: 1 },
        );

        assert_eq!(timers.next_deadline(), Some(now + Duration::from_secs(1)));
        assert!(timers.take_due(now).is_empty());

        let fired = timers.take_due(now + Duration::from_secs(10));
        assert_eq!(
            fired,
            vec![
                Deferred::SkipUnplayable { generation: 1 },
                Deferred::SleepTimerExpired
            ]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn cancel_removes_only_that_task() {
        let now = Instant::now();
        let mut timers = Timers::new();
        let first = timers.schedule(now, Deferred::SleepTimerExpired);
        timers.schedule(now, Deferred::FallbackCooldown { generation: 3 });

        assert!(timers.cancel(first));
        assert!(!timers.cancel(first));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn retain_generation_keeps_unbound_tasks() {
        let now = Instant::now();
        let mut timers = Timers::new();
        timers.schedule(now, Deferred::SkipUnplayable { generation: 1 });
        timers.schedule(now, Deferred::FallbackCooldown { generation: 2 });
        timers.schedule(now, Deferred::SleepTimerExpired);

        timers.retain_generation(2);

        assert!(!timers.contains(Deferred::SkipUnplayable { generation: 1 }));
        assert!(timers.contains(Deferred::FallbackCooldown { generation: 2 }));
        assert!(timers.contains(Deferred::SleepTimerExpired));
    }
}
