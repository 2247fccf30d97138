/// Desktop audio errors
use cadence_playback::PlaybackError;
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// File does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container could not be probed
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Container holds no decodable audio track
    #[error("No audio track found")]
    NoAudioTrack,

    /// Malformed packet or codec failure
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// No output device
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Audio thread went away
    #[error("Audio thread disconnected")]
    Disconnected,
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<AudioError> for PlaybackError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::FileNotFound(_)
            | AudioError::Io(_)
            | AudioError::UnsupportedFormat(_)
            | AudioError::NoAudioTrack => PlaybackError::SourceUnavailable(err.to_string()),
            AudioError::DecodeError(msg) => PlaybackError::DecodeFault(msg),
            AudioError::DeviceNotFound
            | AudioError::StreamBuildError(_)
            | AudioError::PlayError(_)
            | AudioError::Disconnected => PlaybackError::Sink(err.to_string()),
        }
    }
}
