//! Local file tracks decoded with Symphonia
//!
//! # Frames
//!
//! A frame is one container packet of the file's default audio track.
//! `FileTrack::open` scans the file once to count packets and add up their
//! durations, so frame counts and lengths are exact rather than estimated
//! from headers.
//!
//! # Sample conversion
//!
//! Every Symphonia sample format is normalized to f32 in [-1.0, 1.0] and
//! interleaved as stereo (mono is duplicated, extra channels are dropped):
//! - **Float formats**: pass through (F32) or cast (F64)
//! - **Signed ints**: divide by MAX value
//! - **Unsigned ints**: normalize to [0,1], scale to [-1,1]
//! - **24-bit types**: extract `.inner()`, normalize

use crate::error::{AudioError, Result};
use cadence_playback::{FrameStream, SampleBuffer, Track, TrackInfo};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::{Hint, ProbeResult};
use tracing::{debug, trace};

const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Output channel count of every decoded buffer
const OUTPUT_CHANNELS: u16 = 2;

/// Audio file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileTrack {
    path: PathBuf,
    info: TrackInfo,
    frames: u64,
    ms_per_frame: f64,
    sample_rate: u32,
}

impl FileTrack {
    /// Probe `path`, read its tags and measure it
    ///
    /// # Returns
    /// * `Ok(track)` - Track ready to be queued
    /// * `Err(_)` - Missing file, unsupported container or no audio track
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut probed = probe(&path)?;

        let info = read_info(&path, &mut probed);

        let (track_id, sample_rate, time_base) = {
            let track = probed
                .format
                .default_track()
                .ok_or(AudioError::NoAudioTrack)?;
            let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
            (track.id, sample_rate, track.codec_params.time_base)
        };

        // One pass over the packets for an exact frame count and duration
        let mut frames = 0u64;
        let mut duration_ts = 0u64;
        loop {
            match probed.format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => {
                    frames += 1;
                    duration_ts += packet.dur();
                }
                Ok(_) => {}
                Err(e) if is_end_of_stream(&e) => break,
                Err(e) => return Err(AudioError::DecodeError(e.to_string())),
            }
        }

        let total_ms = match time_base {
            Some(time_base) => {
                let time = time_base.calc_time(duration_ts);
                (time.seconds as f64 + time.frac) * 1000.0
            }
            None => duration_ts as f64 * 1000.0 / f64::from(sample_rate),
        };
        let ms_per_frame = if frames == 0 {
            0.0
        } else {
            total_ms / frames as f64
        };

        debug!(
            path = %path.display(),
            frames,
            sample_rate,
            "Measured {} ({:.0} ms)",
            info.title,
            total_ms
        );

        Ok(Self {
            path,
            info,
            frames,
            ms_per_frame,
            sample_rate,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sample rate of the file's default track
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Track for FileTrack {
    fn info(&self) -> &TrackInfo {
        &self.info
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn ms_per_frame(&self) -> f64 {
        self.ms_per_frame
    }

    fn open_stream(&self) -> cadence_playback::Result<Box<dyn FrameStream>> {
        let stream = SymphoniaStream::open(&self.path)?;
        Ok(Box::new(stream))
    }
}

/// Forward-only packet stream over one file
pub struct SymphoniaStream {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,

    /// Set by `skip_frame`; the decoder's state no longer matches the stream
    needs_reset: bool,
}

impl SymphoniaStream {
    /// Open `path` positioned at its first packet
    pub fn open(path: &Path) -> Result<Self> {
        let probed = probe(path)?;
        let format_reader = probed.format;

        let track = format_reader
            .default_track()
            .ok_or(AudioError::NoAudioTrack)?;
        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::UnsupportedFormat(format!("No decoder: {}", e)))?;

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            needs_reset: false,
        })
    }

    /// Next packet of the default track, or `None` at end of stream
    fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            match self.format_reader.next_packet() {
                Ok(packet) if packet.track_id() == self.track_id => return Ok(Some(packet)),
                Ok(_) => {}
                Err(e) if is_end_of_stream(&e) => return Ok(None),
                Err(e) => {
                    return Err(AudioError::DecodeError(format!(
                        "Error reading packet: {}",
                        e
                    )))
                }
            }
        }
    }
}

impl FrameStream for SymphoniaStream {
    fn decode_frame(&mut self) -> cadence_playback::Result<Option<SampleBuffer>> {
        let Some(packet) = self.next_packet()? else {
            return Ok(None);
        };

        // Stateful codecs (MP3 bit reservoir) must not carry state across skipped packets
        if self.needs_reset {
            self.decoder.reset();
            self.needs_reset = false;
        }

        let decoded = self
            .decoder
            .decode(&packet)
            .map_err(|e| AudioError::DecodeError(e.to_string()))?;

        let samples = convert_to_f32_interleaved(decoded);
        Ok(Some(SampleBuffer::new(
            samples,
            OUTPUT_CHANNELS,
            self.sample_rate,
        )))
    }

    fn skip_frame(&mut self) -> cadence_playback::Result<bool> {
        let skipped = self.next_packet()?.is_some();
        self.needs_reset |= skipped;
        trace!(skipped, "Skipped packet");
        Ok(skipped)
    }
}

fn probe(path: &Path) -> Result<ProbeResult> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe file: {}", e)))
}

fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

/// Title, album and artist with fallbacks for missing tags
fn read_info(path: &Path, probed: &mut ProbeResult) -> TrackInfo {
    let mut title = None;
    let mut album = None;
    let mut artist = None;

    // Tags found while probing (e.g. ID3v2), then container tags
    if let Some(log) = probed.metadata.get() {
        if let Some(revision) = log.current() {
            read_tags(revision, &mut title, &mut album, &mut artist);
        }
    }
    let container = probed.format.metadata();
    if let Some(revision) = container.current() {
        read_tags(revision, &mut title, &mut album, &mut artist);
    }

    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    });

    TrackInfo::new(
        title,
        album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
        artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
    )
}

fn read_tags(
    revision: &MetadataRevision,
    title: &mut Option<String>,
    album: &mut Option<String>,
    artist: &mut Option<String>,
) {
    for tag in revision.tags() {
        let value = tag.value.to_string();
        if value.trim().is_empty() {
            continue;
        }
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => *title = Some(value),
            Some(StandardTagKey::Album) => *album = Some(value),
            Some(StandardTagKey::Artist) => *artist = Some(value),
            Some(StandardTagKey::AlbumArtist) if artist.is_none() => *artist = Some(value),
            _ => {}
        }
    }
}

/// Interleave a planar buffer as stereo f32
fn interleave_to_stereo_f32<T, F>(buf: &symphonia::core::audio::AudioBuffer<T>, normalize: F) -> Vec<f32>
where
    T: symphonia::core::sample::Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut output = Vec::with_capacity(frames * 2);

    for frame_idx in 0..frames {
        output.push(normalize(buf.chan(0)[frame_idx]));
        if channels > 1 {
            output.push(normalize(buf.chan(1)[frame_idx]));
        } else {
            output.push(normalize(buf.chan(0)[frame_idx]));
        }
    }

    output
}

fn convert_to_f32_interleaved(decoded: AudioBufferRef) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_to_stereo_f32(&buf, |s| s),
        AudioBufferRef::F64(buf) => interleave_to_stereo_f32(&buf, |s| s as f32),

        AudioBufferRef::S8(buf) => interleave_to_stereo_f32(&buf, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i16::MAX as f32)
        }
        AudioBufferRef::S24(buf) => {
            interleave_to_stereo_f32(&buf, |s| s.inner() as f32 / 8388607.0)
        }
        AudioBufferRef::S32(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i32::MAX as f32)
        }

        AudioBufferRef::U8(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = FileTrack::open("/definitely/not/here.flac").unwrap_err();
        assert!(matches!(err, AudioError::FileNotFound(_)));
    }

    #[test]
    fn stream_on_missing_file_is_source_unavailable() {
        let err = SymphoniaStream::open(Path::new("/definitely/not/here.mp3"))
            .map(|_| ())
            .map_err(cadence_playback::PlaybackError::from)
            .unwrap_err();
        assert!(matches!(
            err,
            cadence_playback::PlaybackError::SourceUnavailable(_)
        ));
    }
}
