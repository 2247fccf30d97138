//! Playback queue with canonical and presentation orders
//!
//! ```text
//! canonical:    A B C D E      (insertion order, kept for restoring)
//! presentation: C A E B D      (what plays; equals canonical unless shuffled)
//!                   ^
//!                 cursor
//! ```
//!
//! The cursor indexes the presentation order. Any value at or past the end
//! means nothing is selected.

use crate::error::{PlaybackError, Result};
use crate::shuffle::{draw_seed, shuffle_pinned, shuffle_with_seed};
use crate::source::Track;
use crate::types::TrackInfo;
use std::fmt;
use std::sync::Arc;

/// Identity of one queued entry
///
/// Adding the same track twice yields two entries with distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A track paired with its display metadata
#[derive(Clone)]
pub struct QueueEntry {
    id: EntryId,
    track: Arc<dyn Track>,
    info: TrackInfo,
}

impl QueueEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn track(&self) -> &Arc<dyn Track> {
        &self.track
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("id", &self.id)
            .field("title", &self.info.title)
            .finish()
    }
}

/// What the controller must do after a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The running track is unaffected
    Removed,

    /// The running track was the last entry; playback must stop
    StopCurrent,

    /// The running track was removed; the worker must release its session
    /// and load whatever now occupies the same index
    RemoveCurrent,
}

/// Queue of tracks with shuffle and loop policy
#[derive(Debug, Clone)]
pub struct PlaybackQueue {
    /// Insertion order, restored when shuffle is turned off
    canonical: Vec<QueueEntry>,

    /// Order currently played and displayed
    presentation: Vec<QueueEntry>,

    /// Index into `presentation`
    cursor: usize,

    shuffled: bool,
    looping: bool,

    /// Seed of the current shuffled order
    seed: Option<u64>,

    /// Seed used for every shuffle instead of a fresh one
    fixed_seed: Option<u64>,

    next_id: u64,
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            canonical: Vec::new(),
            presentation: Vec::new(),
            cursor: 0,
            shuffled: false,
            looping: false,
            seed: None,
            fixed_seed: None,
            next_id: 0,
        }
    }

    /// Use `seed` for every future shuffle
    pub fn with_fixed_seed(mut self, seed: Option<u64>) -> Self {
        self.fixed_seed = seed;
        self
    }

    /// Append a track to both orders
    pub fn add(&mut self, track: Arc<dyn Track>) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;

        let entry = QueueEntry {
            id,
            info: track.info().clone(),
            track,
        };

        self.canonical.push(entry.clone());
        self.presentation.push(entry);
        id
    }

    /// Remove the entry at `index` of the presentation order
    ///
    /// `active` tells whether a worker is currently playing the entry at the
    /// cursor.
    pub fn remove_at(&mut self, index: usize, active: bool) -> Result<(QueueEntry, RemoveOutcome)> {
        let len = self.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        let outcome = if active && index == self.cursor {
            if index == len - 1 {
                RemoveOutcome::StopCurrent
            } else {
                RemoveOutcome::RemoveCurrent
            }
        } else {
            if index < self.cursor {
                self.cursor -= 1;
            }
            RemoveOutcome::Removed
        };

        let entry = self.presentation.remove(index);
        if let Some(pos) = self.canonical.iter().position(|e| e.id == entry.id) {
            self.canonical.remove(pos);
        }

        Ok((entry, outcome))
    }

    /// Flip shuffle and rebuild the presentation order
    ///
    /// Returns the new shuffle flag.
    pub fn toggle_shuffle(&mut self, active: bool) -> bool {
        if self.shuffled {
            if let Some(current) = self.presentation.get(self.cursor) {
                let id = current.id;
                if let Some(pos) = self.canonical.iter().position(|e| e.id == id) {
                    self.cursor = pos;
                }
            }
            self.presentation.clone_from(&self.canonical);
            self.shuffled = false;
            self.seed = None;
        } else {
            self.canonical.clone_from(&self.presentation);

            let seed = self.fixed_seed.unwrap_or_else(draw_seed);
            if active {
                shuffle_pinned(&mut self.presentation, self.cursor, seed);
            } else {
                shuffle_with_seed(&mut self.presentation, seed);
            }

            self.cursor = 0;
            self.seed = Some(seed);
            self.shuffled = true;
        }

        self.shuffled
    }

    /// Flip loop; returns the new flag
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Move the cursor forward, wrapping to 0 from the last entry when looping
    pub fn advance(&mut self) {
        let len = self.len();
        if self.looping && len > 0 && self.cursor + 1 == len {
            self.cursor = 0;
        } else {
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Move the cursor back, wrapping to the last entry from 0 when looping
    ///
    /// Without loop, retreating from 0 leaves nothing selected.
    pub fn retreat(&mut self) {
        let len = self.len();
        if self.cursor == 0 {
            self.cursor = if self.looping && len > 0 { len - 1 } else { len };
        } else {
            self.cursor -= 1;
        }
    }

    /// Deselect: move the cursor past the end
    pub fn stop(&mut self) {
        self.cursor = self.len();
    }

    /// Bring a cursor sitting exactly at the end back to 0 when looping
    pub fn wrap_if_looping(&mut self) {
        if self.looping && !self.is_empty() && self.cursor == self.len() {
            self.cursor = 0;
        }
    }

    /// Entry under the cursor, if any
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.presentation.get(self.cursor)
    }

    /// Cursor if it points at an entry
    pub fn current_index(&self) -> Option<usize> {
        (self.cursor < self.len()).then_some(self.cursor)
    }

    /// Raw cursor, possibly past the end
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.presentation.get(index)
    }

    /// Entries in presentation order
    pub fn presentation(&self) -> &[QueueEntry] {
        &self.presentation
    }

    /// Entries in insertion order
    pub fn canonical(&self) -> &[QueueEntry] {
        &self.canonical
    }

    /// Display metadata in presentation order
    pub fn entries(&self) -> Vec<TrackInfo> {
        self.presentation.iter().map(|e| e.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.presentation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presentation.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Seed of the current shuffled order
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.seed
    }
}
