//! Frame-accurate seeking on forward-only streams
//!
//! Streams cannot rewind, so a backward seek reopens the track and skips
//! forward from frame 0. Skipping reads frame headers only; nothing reaches
//! the sink.

use crate::error::Result;
use crate::session::DecodeSession;
use crate::source::SinkFactory;
use crate::transport::TransportState;
use tracing::trace;

/// Convert a scrub position into a frame index
pub fn frame_for_position(position_ms: u64, ms_per_frame: f64) -> u64 {
    if ms_per_frame <= 0.0 {
        return 0;
    }
    (position_ms as f64 / ms_per_frame).floor() as u64
}

/// Result of a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The frame counter now equals the target
    Reached(u64),

    /// The track ended first; the counter sits at its last frame
    Underrun(u64),

    /// No session was open, nothing moved
    NotOpen,

    /// The request was made for a track that is no longer loaded
    Stale,
}

/// Move `session` to `target` and keep the transport's counter in step
///
/// Must be called with the controller lock held.
pub fn seek_session(
    transport: &mut TransportState,
    session: &mut DecodeSession,
    sinks: &dyn SinkFactory,
    target: u64,
) -> Result<SeekOutcome> {
    if !session.is_open() {
        return Ok(SeekOutcome::NotOpen);
    }

    if target < transport.current_frame() {
        transport.set_current_frame(0);
        if !session.reopen(sinks) {
            return Ok(SeekOutcome::NotOpen);
        }
    }

    while transport.current_frame() < target {
        if !session.skip_frame()? {
            trace!(
                frame = transport.current_frame(),
                target,
                "Seek ran past end of track"
            );
            return Ok(SeekOutcome::Underrun(transport.current_frame()));
        }
        transport.frame_done();
    }

    Ok(SeekOutcome::Reached(target))
}
