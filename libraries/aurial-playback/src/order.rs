//! Play-order policy
//!
//! Pure functions from queue state to the next or previous index. Nothing
//! here touches the transport or mutates the queue.
//!
//! `RepeatMode::One` only matters for natural end-of-track, which the player
//! handles itself. For explicit navigation only `RepeatMode::All` wraps.

use rand::Rng;

use crate::queue::Queue;
use crate::types::RepeatMode;

/// Index to play after the current one, `None` when the queue is exhausted
pub fn next_index<R: Rng>(queue: &Queue, rng: &mut R) -> Option<usize> {
    if queue.shuffle_active() {
        random_other(queue, rng)
    } else {
        sequential_next(queue)
    }
}

/// Index to play before the current one
///
/// Under shuffle this re-rolls rather than walking back through what was
/// played; there is no history.
pub fn prev_index<R: Rng>(queue: &Queue, rng: &mut R) -> Option<usize> {
    if queue.shuffle_active() {
        random_other(queue, rng)
    } else {
        sequential_prev(queue)
    }
}

/// Sequential successor, wrapping only under `RepeatMode::All`
pub fn sequential_next(queue: &Queue) -> Option<usize> {
    let current = queue.current_index()?;
    let len = queue.len();

    if current + 1 < len {
        Some(current + 1)
    } else if queue.repeat_mode() == RepeatMode::All {
        Some(0)
    } else {
        None
    }
}

/// Sequential predecessor, wrapping only under `RepeatMode::All`
pub fn sequential_prev(queue: &Queue) -> Option<usize> {
    let current = queue.current_index()?;

    if current > 0 {
        Some(current - 1)
    } else if queue.repeat_mode() == RepeatMode::All {
        Some(queue.len() - 1)
    } else {
        None
    }
}

/// Uniform pick among all indices except the current one
///
/// A single-track queue returns its only index.
pub fn random_other<R: Rng>(queue: &Queue, rng: &mut R) -> Option<usize> {
    let current = queue.current_index()?;
    let len = queue.len();

    if len <= 1 {
        return Some(current);
    }

    // Draw from len - 1 slots and step over the current index
    let pick = rng.gen_range(0..len - 1);
    Some(if pick >= current { pick + 1 } else { pick })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurial_core::Track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn queue_of(len: usize, current: usize) -> Queue {
        let tracks = (0..len)
            .map(|i| Arc::new(Track::new(format!("t{}", i), format!("Track {}", i))))
            .collect();
        let mut queue = Queue::new();
        queue.replace(tracks, current);
        queue
    }

    #[test]
    fn sequential_next_advances_and_stops() {
        let queue = queue_of(3, 1);
        assert_eq!(sequential_next(&queue), Some(2));

        let queue = queue_of(3, 2);
        assert_eq!(sequential_next(&queue), None);
    }

    #[test]
    fn repeat_all_wraps_both_ways() {
        let mut queue = queue_of(3, 2);
        queue.set_repeat(RepeatMode::All);
        assert_eq!(sequential_next(&queue), Some(0));

        queue.set_current(0);
        assert_eq!(sequential_prev(&queue), Some(2));
    }

    #[test]
    fn repeat_one_does_not_wrap_explicit_navigation() {
        let mut queue = queue_of(3, 2);
        queue.set_repeat(RepeatMode::One);
        assert_eq!(sequential_next(&queue), None);

        queue.set_current(1);
        assert_eq!(sequential_next(&queue), Some(2));
    }

    #[test]
    fn prev_at_start_without_repeat_is_none() {
        let queue = queue_of(3, 0);
        assert_eq!(sequential_prev(&queue), None);
    }

    #[test]
    fn empty_queue_has_no_neighbours() {
        let queue = Queue::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(next_index(&queue, &mut rng), None);
        assert_eq!(prev_index(&queue, &mut rng), None);
    }

    #[test]
    fn shuffle_never_repeats_current_and_covers_the_rest() {
        let mut queue = queue_of(5, 2);
        queue.set_shuffle(true);
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = HashSet::new();
        for _ in 0..500 {
            let pick = next_index(&queue, &mut rng).unwrap();
            assert_ne!(pick, 2);
            assert!(pick < 5);
            seen.insert(pick);
        }
        assert_eq!(seen, HashSet::from([0, 1, 3, 4]));
    }

    #[test]
    fn shuffle_single_track_returns_same_index() {
        let mut queue = queue_of(1, 0);
        queue.set_shuffle(true);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(next_index(&queue, &mut rng), Some(0));
        assert_eq!(prev_index(&queue, &mut rng), Some(0));
    }

    #[test]
    fn shuffle_ignores_end_of_queue() {
        let mut queue = queue_of(3, 2);
        queue.set_shuffle(true);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(next_index(&queue, &mut rng).is_some());
    }
}
