//! Transport state shared between the command surface and the worker
//!
//! Lives inside the controller's single lock. Pending commands are one-shot
//! flags: the surface raises them, the worker consumes all of them at once
//! when it drains the current track.

use crate::types::PlayPause;

/// One-shot commands waiting for the next frame boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlags {
    pub advance: bool,
    pub retreat: bool,
    pub stop: bool,
    pub remove_current: bool,
}

impl PendingFlags {
    pub fn any(&self) -> bool {
        self.advance || self.retreat || self.stop || self.remove_current
    }
}

/// Queue movement applied when a track drains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Deselect and terminate
    Stop,

    /// Loop-aware advance requested by the user
    Next,

    /// Loop-aware retreat requested by the user
    Previous,

    /// Current entry was removed; the cursor already points at its successor
    RemoveCurrent,

    /// Track ran out of frames
    NaturalEnd,
}

/// Frame counter, play/pause flag and pending commands
#[derive(Debug, Clone)]
pub struct TransportState {
    current_frame: u64,
    play_state: PlayPause,
    pending: PendingFlags,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportState {
    pub fn new() -> Self {
        Self {
            current_frame: 0,
            play_state: PlayPause::Paused,
            pending: PendingFlags::default(),
        }
    }

    /// Reset for a freshly loaded track
    pub fn begin_track(&mut self) {
        self.current_frame = 0;
        self.play_state = PlayPause::Playing;
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn set_current_frame(&mut self, frame: u64) {
        self.current_frame = frame;
    }

    /// Count one frame played or skipped
    pub fn frame_done(&mut self) {
        self.current_frame += 1;
    }

    pub fn play_state(&self) -> PlayPause {
        self.play_state
    }

    pub fn set_play_state(&mut self, state: PlayPause) {
        self.play_state = state;
    }

    pub fn toggle_play_pause(&mut self) -> PlayPause {
        self.play_state = self.play_state.toggled();
        self.play_state
    }

    pub fn is_paused(&self) -> bool {
        self.play_state == PlayPause::Paused
    }

    pub fn pending(&self) -> PendingFlags {
        self.pending
    }

    /// Whether the worker must leave its frame loop
    pub fn has_pending(&self) -> bool {
        self.pending.any()
    }

    pub fn request_stop(&mut self) {
        self.pending.stop = true;
    }

    pub fn request_next(&mut self) {
        self.pending.advance = true;
    }

    pub fn request_previous(&mut self) {
        self.pending.retreat = true;
    }

    pub fn request_remove_current(&mut self) {
        self.pending.remove_current = true;
    }

    /// Consume every pending flag and pick the transition to apply
    ///
    /// Priority: stop > next > previous > remove-current > natural end.
    /// The play flag drops to paused until the next track begins.
    pub fn take_transition(&mut self) -> Transition {
        let pending = std::mem::take(&mut self.pending);
        self.play_state = PlayPause::Paused;

        if pending.stop {
            Transition::Stop
        } else if pending.advance {
            Transition::Next
        } else if pending.retreat {
            Transition::Previous
        } else if pending.remove_current {
            Transition::RemoveCurrent
        } else {
            Transition::NaturalEnd
        }
    }

    /// Drop pending commands without applying them
    pub fn clear_pending(&mut self) {
        self.pending = PendingFlags::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_wins_over_everything() {
        let mut transport = TransportState::new();
        transport.request_next();
        transport.request_previous();
        transport.request_remove_current();
        transport.request_stop();

        assert_eq!(transport.take_transition(), Transition::Stop);
        assert!(!transport.has_pending());
    }

    #[test]
    fn priority_order() {
        let mut transport = TransportState::new();

        transport.request_previous();
        transport.request_next();
        assert_eq!(transport.take_transition(), Transition::Next);

        transport.request_remove_current();
        transport.request_previous();
        assert_eq!(transport.take_transition(), Transition::Previous);

        transport.request_remove_current();
        assert_eq!(transport.take_transition(), Transition::RemoveCurrent);

        assert_eq!(transport.take_transition(), Transition::NaturalEnd);
    }

    #[test]
    fn begin_track_resets_counter_and_plays() {
        let mut transport = TransportState::new();
        transport.frame_done();
        transport.frame_done();
        assert_eq!(transport.current_frame(), 2);

        transport.begin_track();
        assert_eq!(transport.current_frame(), 0);
        assert_eq!(transport.play_state(), PlayPause::Playing);
    }

    #[test]
    fn transition_pauses_until_next_track() {
        let mut transport = TransportState::new();
        transport.begin_track();
        transport.take_transition();
        assert!(transport.is_paused());
    }

    #[test]
    fn toggle_flips_play_state() {
        let mut transport = TransportState::new();
        transport.begin_track();
        assert_eq!(transport.toggle_play_pause(), PlayPause::Paused);
        assert_eq!(transport.toggle_play_pause(), PlayPause::Playing);
    }

    #[test]
    fn clear_pending_drops_commands() {
        let mut transport = TransportState::new();
        transport.request_stop();
        transport.clear_pending();
        assert_eq!(transport.pending(), PendingFlags::default());
    }
}
