//! Playback Events
//!
//! Notifications for the control surface. The worker never calls into the
//! surface directly: events go through a channel that the surface drains on
//! its own thread. Emitted at key points:
//! - Track loaded (metadata + control enablement)
//! - Each played frame (progress)
//! - Queue edits, shuffle and loop toggles
//! - Play/pause flips
//! - Worker termination (reset)

use crate::types::{IconState, TrackInfo, TransportControls};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A new track became current
    TrackChanged {
        title: String,
        album: String,
        artist: String,
    },

    /// Playback position of the current track
    Progress {
        elapsed_ms: u64,
        total_ms: u64,
    },

    /// Which controls should be enabled
    TransportEnabled(TransportControls),

    /// Queue contents in presentation order
    QueueChanged {
        entries: Vec<TrackInfo>,
    },

    /// Play/pause button icon
    PlaybackIcon(IconState),

    /// Nothing is selected any more
    Reset,
}

impl PlayerEvent {
    pub fn track_changed(info: &TrackInfo) -> Self {
        Self::TrackChanged {
            title: info.title.clone(),
            album: info.album.clone(),
            artist: info.artist.clone(),
        }
    }
}

/// Sending half of the event channel
///
/// Sends never block and never fail loudly; a surface that went away just
/// stops receiving.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<PlayerEvent>,
}

impl EventSender {
    pub fn emit(&self, event: PlayerEvent) {
        self.tx.send(event).ok();
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = PlayerEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Create a connected sender/receiver pair
pub fn channel() -> (EventSender, Receiver<PlayerEvent>) {
    let (tx, rx) = unbounded();
    (EventSender { tx }, rx)
}
