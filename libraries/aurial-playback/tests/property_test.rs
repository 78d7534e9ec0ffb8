//! Property-based tests for the player
//!
//! Random operation sequences must never break the queue or volume
//! invariants.


use std::sync::Arc;
use std::time::Duration;

use aurial_core::Track;
use aurial_playback::{PlaybackState, TransportEvent};
use proptest::prelude::*;
use test_helpers::Harness;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Op {
    SetQueue(Vec<Arc<Track>>, usize),
    Append(Vec<Arc<Track>>),
    InsertNext(Vec<Arc<Track>>),
    Play,
    PlayAt(usize),
    Next,
    Prev,
    ToggleShuffle,
    ToggleRepeat,
    PlayPause,
    Ended,
    Error,
    Resolve,
    TimeUpdate(f64),
    Volume(f32),
    ToggleMute,
    Tick,
}

fn arbitrary_track() -> impl Strategy<Value = Arc<Track>> {
    ("[a-z0-9]{1,8}", any::<bool>(), 0u8..10).prop_map(|(id, local, roll)| {
        let mut track = Track::new(id, "Song").with_duration(200.0);
        if local {
            track = track.local();
        }
        // Roughly one in ten is not streamable
        if roll == 0 {
            track = track.unavailable();
        }
        Arc::new(track)
    })
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Arc<Track>>> {
    prop::collection::vec(arbitrary_track(), 0..12)
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arbitrary_tracks(), 0usize..20).prop_map(|(t, i)| Op::SetQueue(t, i)),
        arbitrary_tracks().prop_map(Op::Append),
        arbitrary_tracks().prop_map(Op::InsertNext),
        Just(Op::Play),
        (0usize..20).prop_map(Op::PlayAt),
        Just(Op::Next),
        Just(Op::Prev),
        Just(Op::ToggleShuffle),
        Just(Op::ToggleRepeat),
        Just(Op::PlayPause),
        Just(Op::Ended),
        Just(Op::Error),
        Just(Op::Resolve),
        (0.0f64..300.0).prop_map(Op::TimeUpdate),
        (-1.0f32..2.0).prop_map(Op::Volume),
        Just(Op::ToggleMute),
        Just(Op::Tick),
    ]
}

fn apply(h: &mut Harness, op: Op) {
    match op {
        Op::SetQueue(tracks, index) => h.player.set_queue(tracks, index),
        Op::Append(tracks) => {
            h.player.add_to_queue(tracks);
        }
        Op::InsertNext(tracks) => {
            h.player.add_next_to_queue(tracks);
        }
        Op::Play => h.player.play_track_from_queue(None),
        Op::PlayAt(index) => h.player.play_at_index(index),
        Op::Next => h.player.play_next(),
        Op::Prev => h.player.play_prev(),
        Op::ToggleShuffle => {
            h.player.toggle_shuffle();
        }
        Op::ToggleRepeat => {
            h.player.toggle_repeat();
        }
        Op::PlayPause => h.player.handle_play_pause(),
        Op::Ended => h.player.handle_transport_event(TransportEvent::Ended),
        Op::Error => h.fail_playback(),
        Op::Resolve => {
            h.start_current();
        }
        Op::TimeUpdate(position) => h.time_update(position),
        Op::Volume(level) => {
            h.player.set_volume(level);
        }
        Op::ToggleMute => {
            h.player.toggle_mute();
        }
        Op::Tick => h.advance(Duration::from_secs(10)),
    }
}

fn assert_invariants(h: &Harness) -> Result<(), TestCaseError> {
    let len = h.player.get_current_queue().len();
    match h.player.current_index() {
        Some(index) => prop_assert!(index < len, "index {} out of range {}", index, len),
        None => prop_assert_eq!(len, 0),
    }

    let volume = h.player.volume();
    prop_assert!((0.0..=1.0).contains(&volume));
    if h.player.is_muted() {
        prop_assert_eq!(h.player.effective_volume(), 0.0);
    } else {
        prop_assert_eq!(h.player.effective_volume(), volume);
    }

    if h.player.state() == PlaybackState::Idle {
        prop_assert!(h.player.current_track().is_none());
    }
    Ok(())
}

// ===== Property Tests =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: queue cursor and volume stay valid under any operation sequence
    #[test]
    fn invariants_hold_for_any_sequence(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let mut h = Harness::new();
        for op in ops {
            apply(&mut h, op);
            assert_invariants(&h)?;
        }
    }

    /// Property: shuffle and repeat toggles never move the cursor
    #[test]
    fn toggles_never_move_cursor(
        tracks in prop::collection::vec(arbitrary_track(), 1..20),
        start in 0usize..20,
        toggles in prop::collection::vec(any::<bool>(), 1..20)
    ) {
        let mut h = Harness::new();
        h.player.set_queue(tracks, start);
        let before = h.player.current_index();

        for shuffle in toggles {
            if shuffle {
                h.player.toggle_shuffle();
            } else {
                h.player.toggle_repeat();
            }
            prop_assert_eq!(h.player.current_index(), before);
        }
    }

    /// Property: skipping forward under shuffle never stays on the same track
    #[test]
    fn shuffle_next_differs_from_current(
        count in 2usize..15,
        start in 0usize..15,
        steps in 1usize..30
    ) {
        let mut h = Harness::new();
        let tracks = (0..count)
            .map(|i| Arc::new(Track::new(format!("t{}", i), "Song")))
            .collect();
        h.player.set_queue(tracks, start);
        h.player.toggle_shuffle();

        for _ in 0..steps {
            let before = h.player.current_index();
            h.player.play_next();
            prop_assert_ne!(h.player.current_index(), before);
        }
    }

    /// Property: add-next always lands right after the cursor
    #[test]
    fn add_next_lands_after_cursor(
        tracks in prop::collection::vec(arbitrary_track(), 1..20),
        start in 0usize..20
    ) {
        let mut h = Harness::new();
        h.player.set_queue(tracks, start);
        let cursor = h.player.current_index();
        let inserted = Arc::new(Track::new("inserted", "Inserted"));

        h.player.add_next_to_queue(vec![Arc::clone(&inserted)]);

        prop_assert_eq!(h.player.current_index(), cursor);
        let at = cursor.map_or(0, |c| c + 1);
        prop_assert_eq!(&h.player.get_current_queue()[at].id, &inserted.id);
    }
}
