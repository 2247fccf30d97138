//! Cadence - Playback Engine
//!
//! Platform-agnostic queued playback for Cadence.
//!
//! This crate provides:
//! - An ordered playback queue with shuffle (seeded, reversible) and loop
//! - A transport with play/pause, stop, next, previous
//! - Frame-accurate seeking on forward-only streams
//! - A playback worker that decodes one frame at a time and reacts to
//!   commands at frame boundaries
//! - An event channel for the control surface
//!
//! # Architecture
//!
//! `cadence-playback` knows nothing about files or audio devices:
//! - No dependency on CPAL (desktop audio)
//! - No dependency on Symphonia (decoding)
//!
//! Tracks, frame streams and sinks are provided via traits
//! ([`Track`], [`FrameStream`], [`AudioSink`], [`SinkFactory`]).
//! `cadence-desktop` implements them for local files and the default output
//! device; [`memory`] has in-memory versions for tests and headless use.
//!
//! # Example
//!
//! ```rust
//! use cadence_playback::memory::{MemorySinkFactory, MemoryTrack};
//! use cadence_playback::{PlaybackConfig, PlaybackController, PlayerEvent};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sinks = MemorySinkFactory::new();
//! let (mut controller, events) =
//!     PlaybackController::new(PlaybackConfig::default(), Arc::new(sinks.clone()));
//!
//! controller.add(Arc::new(MemoryTrack::new("First", 4)));
//! controller.add(Arc::new(MemoryTrack::new("Second", 4)));
//! controller.play_at(0).unwrap();
//!
//! assert!(controller.wait_until_idle(Duration::from_secs(5)));
//! assert_eq!(sinks.written_frames().len(), 8);
//! assert!(events.try_iter().any(|e| e == PlayerEvent::Reset));
//! ```

mod cancel;
mod controller;
mod error;
mod events;
pub mod memory;
mod queue;
mod seek;
mod session;
mod shuffle;
mod source;
mod transport;
pub mod types;

// Public exports
pub use cancel::CancellationToken;
pub use controller::{ControllerSnapshot, PlaybackController, SeekHandle};
pub use error::{PlaybackError, Result};
pub use events::{EventSender, PlayerEvent};
pub use queue::{EntryId, PlaybackQueue, QueueEntry, RemoveOutcome};
pub use seek::{frame_for_position, seek_session, SeekOutcome};
pub use session::DecodeSession;
pub use shuffle::{shuffle_pinned, shuffle_with_seed};
pub use source::{AudioSink, FrameStream, SampleBuffer, SinkFactory, Track};
pub use transport::{PendingFlags, Transition, TransportState};
pub use types::{
    IconState, PlayPause, PlaybackConfig, PlaybackPhase, TrackInfo, TransportControls,
};
