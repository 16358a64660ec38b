// Error types for clip loading and transport control

use thiserror::Error;

/// Everything that can go wrong between a byte stream and the speakers.
#[derive(Error, Debug)]
pub enum ClipError {
    /// The player holds no clip (inert player or already closed)
    #[error("No audio clip loaded")]
    NotLoaded,

    /// Construction was given no stream at all
    #[error("Audio input stream cannot be null")]
    MissingStream,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Probing or decoding the stream failed
    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("No audio track found")]
    NoAudioTrack,

    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Output device could not be found, configured or started
    #[error("Audio device error: {0}")]
    Device(String),

    /// The line does not expose a master gain control
    #[error("Master gain control not supported")]
    GainUnsupported,

    #[error("Volume {0} is outside 0.0..=1.0")]
    InvalidVolume(f32),

    #[error("Gain {value} dB is outside {min}..={max} dB")]
    InvalidGain { value: f32, min: f32, max: f32 },

    /// The line was closed underneath the caller
    #[error("Audio line is closed")]
    Closed,

    /// A deferred action was requested outside a tokio runtime
    #[error("No async runtime available to schedule playback")]
    NoRuntime,

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, ClipError>;
