//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Display metadata for a queued track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track title
    pub title: String,

    /// Album name
    pub album: String,

    /// Artist name
    pub artist: String,
}

impl TrackInfo {
    pub fn new(
        title: impl Into<String>,
        album: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            album: album.into(),
            artist: artist.into(),
        }
    }
}

/// Phase of the playback worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No worker running
    Idle,

    /// Decode session being opened for the current index
    Loading,

    /// Decoding and writing frames
    Playing,

    /// Worker parked, no frames produced
    Paused,

    /// Final frame boundary being applied
    Draining,
}

impl PlaybackPhase {
    /// Whether a worker currently holds (or is about to hold) a session
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Play/pause flag of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayPause {
    Playing,
    Paused,
}

impl PlayPause {
    pub fn toggled(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            Self::Paused => Self::Playing,
        }
    }
}

/// Icon the control surface should show on its play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconState {
    /// Show "play" (nothing is playing)
    Play,

    /// Show "pause" (audio is running)
    Pause,
}

impl From<PlayPause> for IconState {
    fn from(state: PlayPause) -> Self {
        match state {
            PlayPause::Playing => IconState::Pause,
            PlayPause::Paused => IconState::Play,
        }
    }
}

/// Which transport controls the surface should enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportControls {
    pub play_pause: bool,
    pub stop: bool,
    pub scrub: bool,
    pub previous: bool,
    pub next: bool,
    pub shuffle: bool,
    #[serde(rename = "loop")]
    pub loop_: bool,
}

impl TransportControls {
    /// Controls while a track is loaded at `index` of a `len`-long queue
    ///
    /// Previous/next are disabled at the queue boundaries unless looping,
    /// and everything seek-related needs an open session.
    pub fn loaded(index: usize, len: usize, looping: bool, session_open: bool) -> Self {
        Self {
            play_pause: true,
            stop: true,
            scrub: session_open,
            previous: session_open && (index > 0 || looping),
            next: session_open && (index + 1 < len || looping),
            shuffle: len > 0,
            loop_: len > 0,
        }
    }

    /// Controls while nothing is selected
    pub fn idle(len: usize) -> Self {
        Self {
            shuffle: len > 0,
            loop_: len > 0,
            ..Self::default()
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial loop flag (default: false)
    pub looping: bool,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Emit a progress event every N frames (default: 1)
    pub progress_interval: u32,

    /// Fixed shuffle seed for reproducible orders (default: random per toggle)
    pub seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            looping: false,
            shuffle: false,
            progress_interval: 1,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert!(!config.looping);
        assert!(!config.shuffle);
        assert_eq!(config.progress_interval, 1);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn boundary_controls_without_loop() {
        let first = TransportControls::loaded(0, 3, false, true);
        assert!(!first.previous);
        assert!(first.next);

        let last = TransportControls::loaded(2, 3, false, true);
        assert!(last.previous);
        assert!(!last.next);
    }

    #[test]
    fn loop_enables_both_directions() {
        let only = TransportControls::loaded(0, 1, true, true);
        assert!(only.previous);
        assert!(only.next);
    }

    #[test]
    fn unopened_session_disables_navigation() {
        let controls = TransportControls::loaded(1, 3, true, false);
        assert!(controls.play_pause);
        assert!(controls.stop);
        assert!(!controls.scrub);
        assert!(!controls.previous);
        assert!(!controls.next);
    }

    #[test]
    fn idle_controls_follow_queue_contents() {
        assert_eq!(TransportControls::idle(0), TransportControls::default());
        let idle = TransportControls::idle(2);
        assert!(idle.shuffle && idle.loop_);
        assert!(!idle.play_pause && !idle.stop && !idle.scrub);
    }

    #[test]
    fn icon_follows_play_pause() {
        assert_eq!(IconState::from(PlayPause::Playing), IconState::Pause);
        assert_eq!(IconState::from(PlayPause::Paused), IconState::Play);
        assert_eq!(PlayPause::Playing.toggled(), PlayPause::Paused);
    }
}
