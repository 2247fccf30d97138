//! Platform-agnostic decoder and output traits
//!
//! Abstracts frame decoding and audio output so the controller works the same
//! against Symphonia + CPAL on desktop and against in-memory fakes in tests.

use crate::error::Result;
use crate::types::TrackInfo;
use std::fmt::Debug;
use std::time::Duration;

/// Decoded PCM for one frame
///
/// Samples are interleaved f32 in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A playable item
///
/// Implementors are immutable once queued and are shared between the queue,
/// the worker and seek requests.
pub trait Track: Send + Sync + Debug {
    /// Display metadata
    fn info(&self) -> &TrackInfo;

    /// Total number of encoded frames
    fn frame_count(&self) -> u64;

    /// Playback duration of one frame in milliseconds
    fn ms_per_frame(&self) -> f64;

    /// Total playback length in milliseconds
    fn ms_length(&self) -> u64 {
        (self.frame_count() as f64 * self.ms_per_frame()).round() as u64
    }

    /// Open a fresh, forward-only frame stream positioned at frame 0
    ///
    /// # Returns
    /// * `Ok(stream)` - Stream ready for decoding
    /// * `Err(PlaybackError::SourceUnavailable)` - Backing data missing
    fn open_stream(&self) -> Result<Box<dyn FrameStream>>;
}

/// Forward-only stream of encoded frames bound to a decoder
pub trait FrameStream: Send {
    /// Read and decode the next frame
    ///
    /// # Returns
    /// * `Ok(Some(buffer))` - Decoded samples for one frame
    /// * `Ok(None)` - End of stream
    /// * `Err(_)` - Malformed frame data
    fn decode_frame(&mut self) -> Result<Option<SampleBuffer>>;

    /// Read the next frame header and discard its payload
    ///
    /// Returns false at end of stream.
    fn skip_frame(&mut self) -> Result<bool>;
}

/// Destination for decoded PCM
pub trait AudioSink: Send {
    /// Write one frame of samples
    ///
    /// May block while the device queue is full.
    fn write(&mut self, buffer: &SampleBuffer) -> Result<()>;

    /// Audio written but not yet played
    fn queued(&self) -> Duration {
        Duration::ZERO
    }

    /// Release the device, discarding anything still queued
    ///
    /// Called once per session; implementations must tolerate repeated calls
    /// and must not block for longer than one frame.
    fn close(&mut self) {}
}

/// Opens a fresh output sink for each decode session
pub trait SinkFactory: Send + Sync {
    fn open_sink(&self) -> Result<Box<dyn AudioSink>>;
}
