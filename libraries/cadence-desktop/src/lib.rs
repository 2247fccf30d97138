//! Desktop decoding and audio output for Cadence
//!
//! This crate implements the `cadence-playback` collaborator traits for a
//! desktop machine:
//!
//! - [`FileTrack`]: a local audio file probed and measured with Symphonia
//! - [`SymphoniaStream`]: packet-by-packet decoding of one file
//! - [`CpalSinkFactory`] / [`CpalSink`]: output to the default device via CPAL
//!
//! # Example
//!
//! ```no_run
//! use cadence_desktop::{CpalSinkFactory, FileTrack};
//! use cadence_playback::{PlaybackConfig, PlaybackController};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut controller, _events) =
//!     PlaybackController::new(PlaybackConfig::default(), Arc::new(CpalSinkFactory::default()));
//!
//! controller.add(Arc::new(FileTrack::open("/music/song.flac")?));
//! controller.play_at(0)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod output;
mod track;

pub use error::{AudioError, Result};
pub use output::{CpalSink, CpalSinkFactory, DEFAULT_QUEUE_DEPTH};
pub use track::{FileTrack, SymphoniaStream};
