//! Integration tests for FileTrack and SymphoniaStream
//!
//! These tests write real WAV files with hound and decode them back.

use cadence_desktop::{AudioError, FileTrack, SymphoniaStream};
use cadence_playback::memory::MemorySinkFactory;
use cadence_playback::{
    seek_session, DecodeSession, FrameStream, PlaybackConfig, PlaybackController, SeekOutcome,
    Track, TransportState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 44100;

// ===== Test Helpers =====

/// Write a 16-bit sine wave WAV file
fn generate_test_wav(path: &Path, duration_secs: f64, channels: u16) -> PathBuf {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let num_samples = (f64::from(SAMPLE_RATE) * duration_secs) as usize;
    for i in 0..num_samples {
        let t = i as f64 / f64::from(SAMPLE_RATE);
        let sample = ((t * 440.0 * 2.0 * std::f64::consts::PI).sin() * 16000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
    path.to_path_buf()
}

fn decode_all(stream: &mut dyn FrameStream) -> Vec<f32> {
    let mut samples = Vec::new();
    while let Some(buffer) = stream.decode_frame().unwrap() {
        assert_eq!(buffer.channels, 2);
        assert_eq!(buffer.sample_rate, SAMPLE_RATE);
        samples.extend(buffer.samples);
    }
    samples
}

// ===== FileTrack Tests =====

#[test]
fn test_open_measures_frames_and_length() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("tone.wav"), 1.0, 2);

    let track = FileTrack::open(&path).unwrap();

    assert!(track.frame_count() > 0);
    assert!(track.ms_per_frame() > 0.0);
    assert!((track.ms_length() as i64 - 1000).abs() <= 1);
    assert_eq!(track.sample_rate(), SAMPLE_RATE);
    assert_eq!(track.path(), path.as_path());
}

#[test]
fn test_untagged_file_falls_back_to_file_stem() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("Morning Song.wav"), 0.2, 2);

    let track = FileTrack::open(&path).unwrap();

    assert_eq!(track.info().title, "Morning Song");
    assert_eq!(track.info().album, "Unknown Album");
    assert_eq!(track.info().artist, "Unknown Artist");
}

#[test]
fn test_missing_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = FileTrack::open(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, AudioError::FileNotFound(_)));
}

#[test]
fn test_garbage_file_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.wav");
    std::fs::write(&path, b"this is not audio at all").unwrap();

    let err = FileTrack::open(&path).unwrap_err();
    assert!(matches!(err, AudioError::UnsupportedFormat(_)));
}

// ===== SymphoniaStream Tests =====

#[test]
fn test_stream_decodes_every_sample() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("stereo.wav"), 0.5, 2);
    let track = FileTrack::open(&path).unwrap();

    let mut stream = track.open_stream().unwrap();
    let samples = decode_all(stream.as_mut());

    assert_eq!(samples.len(), (SAMPLE_RATE as usize / 2) * 2);
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    assert!(samples.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn test_mono_is_duplicated_to_stereo() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("mono.wav"), 0.25, 1);

    let mut stream = SymphoniaStream::open(&path).unwrap();
    let samples = decode_all(&mut stream);

    assert_eq!(samples.len(), (SAMPLE_RATE as usize / 4) * 2);
    for pair in samples.chunks(2) {
        assert_eq!(pair[0], pair[1]);
    }
}

#[test]
fn test_skip_frames_then_stream_ends() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("skip.wav"), 0.5, 2);
    let track = FileTrack::open(&path).unwrap();

    let mut stream = track.open_stream().unwrap();
    let mut skipped = 0;
    while stream.skip_frame().unwrap() {
        skipped += 1;
    }

    assert_eq!(skipped, track.frame_count());
    assert!(stream.decode_frame().unwrap().is_none());
}

#[test]
fn test_decode_after_skip_matches_straight_decode() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("resume.wav"), 0.5, 2);
    let track = FileTrack::open(&path).unwrap();

    let mut straight = track.open_stream().unwrap();
    let mut decoded = Vec::new();
    while let Some(buffer) = straight.decode_frame().unwrap() {
        decoded.push(buffer);
    }
    assert!(decoded.len() > 3);

    let mut skipping = track.open_stream().unwrap();
    for _ in 0..3 {
        assert!(skipping.skip_frame().unwrap());
    }

    assert_eq!(skipping.decode_frame().unwrap().as_ref(), Some(&decoded[3]));
    assert_eq!(skipping.decode_frame().unwrap().as_ref(), Some(&decoded[4]));
}

#[test]
fn test_seek_session_over_file() {
    let dir = TempDir::new().unwrap();
    let path = generate_test_wav(&dir.path().join("seek.wav"), 1.0, 2);
    let track: Arc<dyn Track> = Arc::new(FileTrack::open(&path).unwrap());
    let frames = track.frame_count();
    let sinks = MemorySinkFactory::new();

    let mut transport = TransportState::new();
    let mut session = DecodeSession::new();
    assert!(session.open(Arc::clone(&track), &sinks));
    transport.begin_track();

    let outcome = seek_session(&mut transport, &mut session, &sinks, frames / 2).unwrap();
    assert_eq!(outcome, SeekOutcome::Reached(frames / 2));
    assert!(sinks.written().is_empty());

    let outcome = seek_session(&mut transport, &mut session, &sinks, frames + 10).unwrap();
    assert_eq!(outcome, SeekOutcome::Underrun(frames));
}

// ===== Controller Integration =====

#[test]
fn test_controller_plays_wav_queue() {
    let dir = TempDir::new().unwrap();
    let first = generate_test_wav(&dir.path().join("first.wav"), 0.3, 2);
    let second = generate_test_wav(&dir.path().join("second.wav"), 0.2, 1);
    let sinks = MemorySinkFactory::new();

    let (mut controller, _events) =
        PlaybackController::new(PlaybackConfig::default(), Arc::new(sinks.clone()));
    controller.add(Arc::new(FileTrack::open(&first).unwrap()));
    controller.add(Arc::new(FileTrack::open(&second).unwrap()));
    controller.add(Arc::new(FileTrack::open(&second).unwrap()));

    // A file removed after queueing is skipped, not fatal
    std::fs::remove_file(&second).unwrap();

    controller.play_at(0).unwrap();
    assert!(controller.wait_until_idle(Duration::from_secs(10)));

    let written: usize = sinks.written().iter().map(|b| b.samples.len()).sum();
    let expected = (SAMPLE_RATE as f64 * 0.3) as usize * 2;
    assert_eq!(written, expected);
    assert_eq!(controller.queue_len(), 3);
    assert_eq!(sinks.opens(), sinks.closes());
}
