//! Seeded shuffle for the presentation order
//!
//! Every permutation is derived from a recorded seed, so the same seed
//! applied to the same canonical order reproduces the same shuffled order.

use crate::queue::QueueEntry;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Draw a fresh seed from the thread RNG
pub fn draw_seed() -> u64 {
    rand::random()
}

/// Fisher-Yates shuffle driven by `seed`
pub fn shuffle_with_seed(entries: &mut [QueueEntry], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    entries.shuffle(&mut rng);
}

/// Shuffle everything except `pinned`, which ends up at position 0
///
/// Used when shuffle is enabled mid-playback so the running track keeps
/// playing at the head of a freshly ordered remainder.
pub fn shuffle_pinned(entries: &mut Vec<QueueEntry>, pinned: usize, seed: u64) {
    if pinned >= entries.len() {
        shuffle_with_seed(entries, seed);
        return;
    }

    let current = entries.remove(pinned);
    shuffle_with_seed(entries, seed);
    entries.insert(0, current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTrack;
    use crate::queue::PlaybackQueue;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn entries(count: usize) -> Vec<QueueEntry> {
        let mut queue = PlaybackQueue::new();
        for i in 0..count {
            queue.add(Arc::new(MemoryTrack::new(format!("Track {}", i), 4)));
        }
        queue.presentation().to_vec()
    }

    fn titles(entries: &[QueueEntry]) -> Vec<String> {
        entries.iter().map(|e| e.info().title.clone()).collect()
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = entries(12);
        let mut b = entries(12);

        shuffle_with_seed(&mut a, 42);
        shuffle_with_seed(&mut b, 42);

        assert_eq!(titles(&a), titles(&b));
    }

    #[test]
    fn shuffle_preserves_all_entries() {
        let mut shuffled = entries(10);
        let before: HashSet<_> = shuffled.iter().map(|e| e.id()).collect();

        shuffle_with_seed(&mut shuffled, 7);

        let after: HashSet<_> = shuffled.iter().map(|e| e.id()).collect();
        assert_eq!(before, after);
        assert_eq!(shuffled.len(), 10);
    }

    #[test]
    fn pinned_entry_moves_to_front() {
        for seed in 0..20 {
            let mut shuffled = entries(8);
            let pinned_id = shuffled[5].id();

            shuffle_pinned(&mut shuffled, 5, seed);

            assert_eq!(shuffled[0].id(), pinned_id);
            assert_eq!(shuffled.len(), 8);
        }
    }

    #[test]
    fn pinned_out_of_range_shuffles_everything() {
        let mut shuffled = entries(3);
        shuffle_pinned(&mut shuffled, 9, 1);
        assert_eq!(shuffled.len(), 3);
    }

    #[test]
    fn empty_and_single_are_stable() {
        let mut none: Vec<QueueEntry> = Vec::new();
        shuffle_pinned(&mut none, 0, 3);
        assert!(none.is_empty());

        let mut one = entries(1);
        let id = one[0].id();
        shuffle_pinned(&mut one, 0, 3);
        assert_eq!(one[0].id(), id);
    }
}
