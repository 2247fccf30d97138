//! Property-based tests for the playback queue
//!
//! Uses proptest to verify cursor invariants across many random queues
//! and edit sequences.

use cadence_playback::memory::MemoryTrack;
use cadence_playback::{PlaybackQueue, RemoveOutcome};
use proptest::prelude::*;
use std::sync::Arc;

// ===== Helpers =====

fn queue_of(len: usize, looping: bool) -> PlaybackQueue {
    let mut queue = PlaybackQueue::new();
    for i in 0..len {
        queue.add(Arc::new(MemoryTrack::new(format!("Track {}", i), 8)));
    }
    queue.set_looping(looping);
    queue
}

fn current_title(queue: &PlaybackQueue) -> Option<String> {
    queue.current_entry().map(|e| e.info().title.clone())
}

fn titles(queue: &PlaybackQueue) -> Vec<String> {
    queue.entries().into_iter().map(|i| i.title).collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: advance then retreat restores the cursor away from wrap points
    #[test]
    fn advance_then_retreat_restores_cursor(
        len in 2usize..40,
        cursor_seed in any::<usize>(),
        looping in any::<bool>(),
    ) {
        let mut queue = queue_of(len, looping);
        let cursor = cursor_seed % (len - 1);
        queue.set_cursor(cursor);

        queue.advance();
        queue.retreat();

        prop_assert_eq!(queue.cursor(), cursor);
    }

    /// Property: with loop on the last and first positions wrap into each other
    #[test]
    fn loop_wraps_at_both_boundaries(len in 1usize..40) {
        let mut queue = queue_of(len, true);

        queue.set_cursor(len - 1);
        queue.advance();
        prop_assert_eq!(queue.current_index(), Some(0));

        queue.retreat();
        prop_assert_eq!(queue.current_index(), Some(len - 1));
    }

    /// Property: without loop, walking off either end leaves nothing selected
    #[test]
    fn no_loop_walks_off_the_ends(len in 1usize..40) {
        let mut queue = queue_of(len, false);

        queue.set_cursor(len - 1);
        queue.advance();
        prop_assert_eq!(queue.current_index(), None);

        queue.set_cursor(0);
        queue.retreat();
        prop_assert_eq!(queue.current_index(), None);
    }

    /// Property: removing any entry other than the current one keeps the
    /// same logical entry current
    #[test]
    fn removing_other_entries_keeps_current(
        len in 2usize..30,
        cursor_seed in any::<usize>(),
        removals in prop::collection::vec(any::<usize>(), 1..10),
        active in any::<bool>(),
    ) {
        let mut queue = queue_of(len, false);
        queue.set_cursor(cursor_seed % len);
        let current = current_title(&queue);

        for removal in removals {
            if queue.len() < 2 {
                break;
            }
            let mut index = removal % queue.len();
            if index == queue.cursor() {
                index = (index + 1) % queue.len();
            }

            let (_, outcome) = queue.remove_at(index, active).unwrap();
            prop_assert_eq!(outcome, RemoveOutcome::Removed);
            prop_assert_eq!(current_title(&queue), current.clone());
        }
    }

    /// Property: removing the current last entry is a stop, never a reuse
    #[test]
    fn removing_current_last_entry_is_stop(len in 1usize..30) {
        let mut queue = queue_of(len, false);
        queue.set_cursor(len - 1);

        let (_, outcome) = queue.remove_at(len - 1, true).unwrap();
        prop_assert_eq!(outcome, RemoveOutcome::StopCurrent);

        queue.stop();
        prop_assert_eq!(queue.cursor(), queue.len());
        prop_assert_eq!(queue.current_index(), None);
    }

    /// Property: shuffle pins the playing entry and unshuffle restores its index
    #[test]
    fn shuffle_round_trip_restores_current(
        len in 1usize..30,
        cursor_seed in any::<usize>(),
        seed in any::<u64>(),
    ) {
        let mut queue = queue_of(len, false).with_fixed_seed(Some(seed));
        let cursor = cursor_seed % len;
        queue.set_cursor(cursor);
        let current = current_title(&queue);
        let original = titles(&queue);

        prop_assert!(queue.toggle_shuffle(true));
        prop_assert_eq!(queue.current_index(), Some(0));
        prop_assert_eq!(current_title(&queue), current.clone());
        prop_assert_eq!(queue.shuffle_seed(), Some(seed));

        let mut shuffled = titles(&queue);
        shuffled.sort();
        let mut sorted = original.clone();
        sorted.sort();
        prop_assert_eq!(shuffled, sorted);

        prop_assert!(!queue.toggle_shuffle(true));
        prop_assert_eq!(queue.current_index(), Some(cursor));
        prop_assert_eq!(titles(&queue), original);
    }

    /// Property: the same seed yields the same shuffled order
    #[test]
    fn same_seed_reproduces_order(len in 1usize..30, seed in any::<u64>()) {
        let mut first = queue_of(len, false).with_fixed_seed(Some(seed));
        let mut second = queue_of(len, false).with_fixed_seed(Some(seed));

        first.toggle_shuffle(false);
        second.toggle_shuffle(false);

        prop_assert_eq!(titles(&first), titles(&second));
    }
}
