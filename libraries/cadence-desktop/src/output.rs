/// CPAL-based audio sink (dedicated audio thread per sink)
use crate::error::{AudioError, Result};
use cadence_playback::{AudioSink, SampleBuffer, SinkFactory};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of decoded frames queued ahead of the device
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// Opens `CpalSink`s on the default output device
#[derive(Debug, Clone, Copy)]
pub struct CpalSinkFactory {
    queue_depth: usize,
}

impl Default for CpalSinkFactory {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl CpalSinkFactory {
    /// `queue_depth` decoded frames may wait for the device before `write` blocks
    pub fn new(queue_depth: usize) -> Self {
        Self {
            queue_depth: queue_depth.max(1),
        }
    }

    /// Check that an output device exists
    ///
    /// # Errors
    /// Returns `DeviceNotFound` in headless environments
    pub fn probe_device() -> Result<()> {
        cpal::default_host()
            .default_output_device()
            .map(|_| ())
            .ok_or(AudioError::DeviceNotFound)
    }
}

impl SinkFactory for CpalSinkFactory {
    fn open_sink(&self) -> cadence_playback::Result<Box<dyn AudioSink>> {
        Self::probe_device()?;
        Ok(Box::new(CpalSink::new(self.queue_depth)))
    }
}

/// Audio thread owning one CPAL stream
struct AudioThread {
    channels: u16,
    sample_rate: u32,
    chunks: Sender<Vec<f32>>,
    shutdown: Sender<()>,
    handle: JoinHandle<()>,

    /// Playback time of the most recent chunk
    chunk_duration: Duration,
}

/// Audio sink writing to the default output device
///
/// **Architecture**: the CPAL stream is not `Send` on every platform, so it
/// is built and held by a dedicated audio thread. `write` hands sample chunks
/// to the stream callback through a bounded channel and blocks while it is
/// full, which paces the decoder to the device.
///
/// The stream is built on the first write, using that buffer's channel count
/// and sample rate. When the callback runs dry it outputs silence. Closing
/// drops whatever is still queued; callers that want a track's tail heard
/// wait on [`AudioSink::queued`] first.
pub struct CpalSink {
    queue_depth: usize,
    thread: Option<AudioThread>,
}

impl CpalSink {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            queue_depth,
            thread: None,
        }
    }

    /// Start the audio thread and wait until its stream is playing
    fn start(&self, channels: u16, sample_rate: u32) -> Result<AudioThread> {
        let (chunk_tx, chunk_rx) = bounded::<Vec<f32>>(self.queue_depth);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("cadence-audio".into())
            .spawn(move || {
                let stream = match build_stream(channels, sample_rate, chunk_rx) {
                    Ok(stream) => {
                        ready_tx.send(Ok(())).ok();
                        stream
                    }
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };

                // Hold the stream until the sink closes
                shutdown_rx.recv().ok();
                drop(stream);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!(channels, sample_rate, "Audio stream started");
                Ok(AudioThread {
                    channels,
                    sample_rate,
                    chunks: chunk_tx,
                    shutdown: shutdown_tx,
                    handle,
                    chunk_duration: Duration::ZERO,
                })
            }
            Ok(Err(e)) => {
                handle.join().ok();
                Err(e)
            }
            Err(_) => {
                handle.join().ok();
                Err(AudioError::Disconnected)
            }
        }
    }

    fn stop_thread(&mut self) {
        let Some(audio) = self.thread.take() else {
            return;
        };

        drop(audio.chunks);
        drop(audio.shutdown);
        if audio.handle.join().is_err() {
            warn!("Audio thread panicked");
        }
        debug!("Audio stream stopped");
    }
}

impl AudioSink for CpalSink {
    fn write(&mut self, buffer: &SampleBuffer) -> cadence_playback::Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let reusable = self
            .thread
            .as_ref()
            .is_some_and(|t| t.channels == buffer.channels && t.sample_rate == buffer.sample_rate);
        if !reusable {
            self.stop_thread();
            self.thread = Some(self.start(buffer.channels, buffer.sample_rate)?);
        }

        let audio = self.thread.as_mut().ok_or(AudioError::Disconnected)?;
        audio.chunk_duration = buffer_duration(buffer);
        audio
            .chunks
            .send(buffer.samples.clone())
            .map_err(|_| AudioError::Disconnected)?;
        Ok(())
    }

    fn queued(&self) -> Duration {
        self.thread.as_ref().map_or(Duration::ZERO, |audio| {
            queued_duration(audio.chunks.len(), audio.chunk_duration)
        })
    }

    fn close(&mut self) {
        self.stop_thread();
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn build_stream(channels: u16, sample_rate: u32, chunks: Receiver<Vec<f32>>) -> Result<Stream> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::DeviceNotFound)?;

    let config = StreamConfig {
        channels,
        sample_rate,
        buffer_size: BufferSize::Default,
    };

    let mut pending = VecDeque::new();
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            fill_output(data, &mut pending, &chunks);
        },
        |err| warn!("Audio stream error: {}", err),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

fn buffer_duration(buffer: &SampleBuffer) -> Duration {
    if buffer.sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(buffer.frames() as f64 / f64::from(buffer.sample_rate))
}

/// Estimate of the audio waiting in the chunk channel
fn queued_duration(chunks: usize, chunk_duration: Duration) -> Duration {
    chunk_duration.saturating_mul(u32::try_from(chunks).unwrap_or(u32::MAX))
}

/// Audio callback body (runs in the real-time audio thread)
fn fill_output(output: &mut [f32], pending: &mut VecDeque<f32>, chunks: &Receiver<Vec<f32>>) {
    for out_sample in output.iter_mut() {
        if pending.is_empty() {
            if let Ok(chunk) = chunks.try_recv() {
                pending.extend(chunk);
            }
        }
        *out_sample = pending.pop_front().unwrap_or(0.0);
    }
}
