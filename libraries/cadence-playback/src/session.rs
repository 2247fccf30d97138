//! Decode session lifecycle
//!
//! Binds one track to an open frame stream and output sink. At most one
//! session exists per controller and it never outlives its track.

use crate::error::Result;
use crate::source::{AudioSink, FrameStream, SinkFactory, Track};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Live binding of a track to a stream and a sink
#[derive(Default)]
pub struct DecodeSession {
    track: Option<Arc<dyn Track>>,
    stream: Option<Box<dyn FrameStream>>,
    sink: Option<Box<dyn AudioSink>>,
}

impl DecodeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `track`, closing whatever was open before
    ///
    /// Failures are logged and leave the session unopened; a session that
    /// is not open simply has no frames. Returns whether the open succeeded.
    pub fn open(&mut self, track: Arc<dyn Track>, sinks: &dyn SinkFactory) -> bool {
        self.close();

        let opened = track
            .open_stream()
            .and_then(|stream| sinks.open_sink().map(|sink| (stream, sink)));

        let title = track.info().title.clone();
        self.track = Some(track);

        match opened {
            Ok((stream, sink)) => {
                debug!("Opened decode session for {}", title);
                self.stream = Some(stream);
                self.sink = Some(sink);
                true
            }
            Err(e) => {
                warn!("Could not open {}: {}", title, e);
                false
            }
        }
    }

    /// Close and reopen the same track from frame 0
    pub fn reopen(&mut self, sinks: &dyn SinkFactory) -> bool {
        match self.track.clone() {
            Some(track) => self.open(track, sinks),
            None => false,
        }
    }

    /// Release stream and sink; safe to call repeatedly
    pub fn close(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
        if self.stream.take().is_some() {
            debug!("Closed decode session");
        }
    }

    /// Close and forget the track
    pub fn release(&mut self) {
        self.close();
        self.track = None;
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some() && self.sink.is_some()
    }

    /// Audio the sink has accepted but not played yet
    pub fn queued(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, |sink| sink.queued())
    }

    /// Track bound to the session (kept after a failed open)
    pub fn track(&self) -> Option<&Arc<dyn Track>> {
        self.track.as_ref()
    }

    /// Decode one frame and write it to the sink
    ///
    /// Returns false when there are no more frames, including when the
    /// session never opened.
    pub fn play_frame(&mut self) -> Result<bool> {
        let (Some(stream), Some(sink)) = (self.stream.as_mut(), self.sink.as_mut()) else {
            return Ok(false);
        };

        match stream.decode_frame()? {
            Some(buffer) => {
                sink.write(&buffer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Read one frame header and drop its payload
    pub fn skip_frame(&mut self) -> Result<bool> {
        match self.stream.as_mut() {
            Some(stream) => stream.skip_frame(),
            None => Ok(false),
        }
    }
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemorySinkFactory, MemoryTrack};

    #[test]
    fn open_play_close() {
        let sinks = MemorySinkFactory::new();
        let track = Arc::new(MemoryTrack::new("A", 2));
        let mut session = DecodeSession::new();

        assert!(session.open(track, &sinks));
        assert!(session.is_open());
        assert!(session.play_frame().unwrap());
        assert!(session.play_frame().unwrap());
        assert!(!session.play_frame().unwrap());

        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(sinks.written_frames(), vec![0, 1]);
        assert_eq!(sinks.closes(), 1);
    }

    #[test]
    fn unopened_session_has_no_frames() {
        let sinks = MemorySinkFactory::new();
        let mut session = DecodeSession::new();

        assert!(!session.open(Arc::new(MemoryTrack::unavailable("X", 5)), &sinks));
        assert!(!session.is_open());
        assert!(!session.play_frame().unwrap());
        assert!(!session.skip_frame().unwrap());
        assert!(session.track().is_some());
    }

    #[test]
    fn failing_sink_leaves_session_unopened() {
        let sinks = MemorySinkFactory::failing();
        let mut session = DecodeSession::new();

        assert!(!session.open(Arc::new(MemoryTrack::new("A", 5)), &sinks));
        assert!(!session.play_frame().unwrap());
    }

    #[test]
    fn reopen_starts_from_frame_zero() {
        let sinks = MemorySinkFactory::new();
        let track = Arc::new(MemoryTrack::new("A", 4));
        let mut session = DecodeSession::new();

        session.open(Arc::clone(&track) as Arc<dyn Track>, &sinks);
        session.play_frame().unwrap();
        session.play_frame().unwrap();

        assert!(session.reopen(&sinks));
        session.play_frame().unwrap();

        assert_eq!(track.opens(), 2);
        assert_eq!(sinks.written_frames(), vec![0, 1, 0]);
    }

    #[test]
    fn close_on_unopened_session_is_safe() {
        let mut session = DecodeSession::new();
        session.close();
        session.release();
        assert!(!session.reopen(&MemorySinkFactory::new()));
    }
}
