//! In-memory tracks and sinks
//!
//! `MemoryTrack` produces synthetic frames where every sample of frame `i`
//! equals `i`, which makes the order of written frames observable through a
//! `MemorySink`. `NullSink` discards audio, optionally sleeping for each
//! buffer's duration to stand in for a real device.

use crate::error::{PlaybackError, Result};
use crate::source::{AudioSink, FrameStream, SampleBuffer, SinkFactory, Track};
use crate::types::TrackInfo;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Sample frames per synthetic frame (per channel)
const SAMPLES_PER_FRAME: usize = 64;
const CHANNELS: u16 = 2;
const SAMPLE_RATE: u32 = 44100;

/// Synthetic track held entirely in memory
#[derive(Debug)]
pub struct MemoryTrack {
    info: TrackInfo,
    frames: u64,
    ms_per_frame: f64,
    frame_delay: Duration,
    available: bool,
    fault_at: Option<u64>,
    opens: AtomicUsize,
    skips: Arc<AtomicU64>,
}

impl MemoryTrack {
    pub fn new(title: impl Into<String>, frames: u64) -> Self {
        Self {
            info: TrackInfo::new(title, "Unknown Album", "Unknown Artist"),
            frames,
            ms_per_frame: 26.0,
            frame_delay: Duration::ZERO,
            available: true,
            fault_at: None,
            opens: AtomicUsize::new(0),
            skips: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Track whose stream can never be opened
    pub fn unavailable(title: impl Into<String>, frames: u64) -> Self {
        Self {
            available: false,
            ..Self::new(title, frames)
        }
    }

    pub fn with_info(mut self, info: TrackInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_ms_per_frame(mut self, ms_per_frame: f64) -> Self {
        self.ms_per_frame = ms_per_frame;
        self
    }

    /// Sleep this long while decoding each frame
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Fail with a decode fault when frame `index` is decoded
    pub fn with_fault_at(mut self, index: u64) -> Self {
        self.fault_at = Some(index);
        self
    }

    /// Number of streams opened so far
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of frames skipped across all streams
    pub fn skips(&self) -> u64 {
        self.skips.load(Ordering::SeqCst)
    }
}

impl Track for MemoryTrack {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn ms_per_frame(&self) -> f64 {
        self.ms_per_frame
    }

    fn open_stream(&self) -> Result<Box<dyn FrameStream>> {
        if !self.available {
            return Err(PlaybackError::SourceUnavailable(format!(
                "{} has no backing data",
                self.info.title
            )));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStream {
            position: 0,
            frames: self.frames,
            frame_delay: self.frame_delay,
            fault_at: self.fault_at,
            skips: Arc::clone(&self.skips),
        }))
    }
}

struct MemoryStream {
    position: u64,
    frames: u64,
    frame_delay: Duration,
    fault_at: Option<u64>,
    skips: Arc<AtomicU64>,
}

impl FrameStream for MemoryStream {
    fn decode_frame(&mut self) -> Result<Option<SampleBuffer>> {
        if self.position >= self.frames {
            return Ok(None);
        }
        if self.fault_at == Some(self.position) {
            return Err(PlaybackError::DecodeFault(format!(
                "corrupt frame {}",
                self.position
            )));
        }

        if !self.frame_delay.is_zero() {
            thread::sleep(self.frame_delay);
        }

        let value = self.position as f32;
        self.position += 1;
        Ok(Some(SampleBuffer::new(
            vec![value; SAMPLES_PER_FRAME * CHANNELS as usize],
            CHANNELS,
            SAMPLE_RATE,
        )))
    }

    fn skip_frame(&mut self) -> Result<bool> {
        if self.position >= self.frames {
            return Ok(false);
        }
        self.position += 1;
        self.skips.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Sink that records every buffer written to it
///
/// With a playout time set, the sink reports that much audio as still queued
/// right after each write, counting down like a device buffer would.
pub struct MemorySink {
    written: Arc<Mutex<Vec<SampleBuffer>>>,
    closes: Arc<AtomicUsize>,
    closed: bool,
    playout: Duration,
    last_write: Option<Instant>,
}

impl AudioSink for MemorySink {
    fn write(&mut self, buffer: &SampleBuffer) -> Result<()> {
        if let Ok(mut written) = self.written.lock() {
            written.push(buffer.clone());
        }
        self.last_write = Some(Instant::now());
        Ok(())
    }

    fn queued(&self) -> Duration {
        match self.last_write {
            Some(at) if !self.closed => self.playout.saturating_sub(at.elapsed()),
            _ => Duration::ZERO,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Factory handing out `MemorySink`s that share one log
#[derive(Clone, Default)]
pub struct MemorySinkFactory {
    written: Arc<Mutex<Vec<SampleBuffer>>>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    peak_open: Arc<AtomicUsize>,
    fail: bool,
    playout: Duration,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose sinks never open
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sinks that keep `playout` worth of audio queued after each write
    pub fn with_playout(mut self, playout: Duration) -> Self {
        self.playout = playout;
        self
    }

    /// Every buffer written so far, in order
    pub fn written(&self) -> Vec<SampleBuffer> {
        self.written
            .lock()
            .map(|written| written.clone())
            .unwrap_or_default()
    }

    /// Frame indices of the written buffers, in order
    pub fn written_frames(&self) -> Vec<u64> {
        self.written()
            .iter()
            .map(|b| b.samples.first().copied().unwrap_or_default() as u64)
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Most sinks that were open at the same time
    pub fn peak_open(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }
}

impl SinkFactory for MemorySinkFactory {
    fn open_sink(&self) -> Result<Box<dyn AudioSink>> {
        if self.fail {
            return Err(PlaybackError::Sink("memory sink disabled".into()));
        }
        let opens = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        let live = opens.saturating_sub(self.closes.load(Ordering::SeqCst));
        self.peak_open.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(MemorySink {
            written: Arc::clone(&self.written),
            closes: Arc::clone(&self.closes),
            closed: false,
            playout: self.playout,
            last_write: None,
        }))
    }
}

/// Sink that discards audio
#[derive(Debug, Default)]
pub struct NullSink {
    paced: bool,
}

impl AudioSink for NullSink {
    fn write(&mut self, buffer: &SampleBuffer) -> Result<()> {
        if self.paced && buffer.sample_rate > 0 {
            let secs = buffer.frames() as f64 / f64::from(buffer.sample_rate);
            thread::sleep(Duration::from_secs_f64(secs));
        }
        Ok(())
    }
}

/// Factory for `NullSink`s
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSinkFactory {
    paced: bool,
}

impl NullSinkFactory {
    /// Sinks that return immediately
    pub fn new() -> Self {
        Self { paced: false }
    }

    /// Sinks that sleep for the duration of each buffer
    pub fn paced() -> Self {
        Self { paced: true }
    }
}

impl SinkFactory for NullSinkFactory {
    fn open_sink(&self) -> Result<Box<dyn AudioSink>> {
        Ok(Box::new(NullSink { paced: self.paced }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stream_yields_indexed_frames() {
        let track = MemoryTrack::new("A", 3);
        let mut stream = track.open_stream().unwrap();

        let mut seen = Vec::new();
        while let Some(buffer) = stream.decode_frame().unwrap() {
            seen.push(buffer.samples[0] as u64);
        }

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(track.opens(), 1);
    }

    #[test]
    fn skip_then_decode_continues_from_position() {
        let track = MemoryTrack::new("A", 5);
        let mut stream = track.open_stream().unwrap();

        assert!(stream.skip_frame().unwrap());
        assert!(stream.skip_frame().unwrap());
        let buffer = stream.decode_frame().unwrap().unwrap();

        assert_eq!(buffer.samples[0], 2.0);
        assert_eq!(track.skips(), 2);
    }

    #[test]
    fn unavailable_track_fails_to_open() {
        let track = MemoryTrack::unavailable("Missing", 10);
        assert!(matches!(
            track.open_stream(),
            Err(PlaybackError::SourceUnavailable(_))
        ));
        assert_eq!(track.opens(), 0);
    }

    #[test]
    fn fault_is_raised_at_requested_frame() {
        let track = MemoryTrack::new("Broken", 4).with_fault_at(1);
        let mut stream = track.open_stream().unwrap();

        assert!(stream.decode_frame().unwrap().is_some());
        assert!(matches!(
            stream.decode_frame(),
            Err(PlaybackError::DecodeFault(_))
        ));
    }

    #[test]
    fn memory_sink_shares_log_across_sinks() {
        let factory = MemorySinkFactory::new();
        let mut first = factory.open_sink().unwrap();
        let mut second = factory.open_sink().unwrap();

        first.write(&SampleBuffer::new(vec![4.0; 2], 2, 44100)).unwrap();
        second.write(&SampleBuffer::new(vec![9.0; 2], 2, 44100)).unwrap();
        first.close();
        first.close();

        assert_eq!(factory.written_frames(), vec![4, 9]);
        assert_eq!(factory.opens(), 2);
        assert_eq!(factory.closes(), 1);
    }

    #[test]
    fn ms_length_from_frames() {
        let track = MemoryTrack::new("A", 10).with_ms_per_frame(26.0);
        assert_eq!(track.ms_length(), 260);
    }
}
