//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The track's backing stream could not be opened
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Malformed frame data or a failed write to the output sink
    #[error("Decode fault: {0}")]
    DecodeFault(String),

    /// The output sink could not be opened
    #[error("Audio sink error: {0}")]
    Sink(String),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
