//! Error taxonomy for the recording/transcription/generation pipeline.
//!
//! Session-level code returns `TabibError` so callers can distinguish the
//! failure classes; the command layer converts to `anyhow::Error` at the
//! boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabibError {
    /// Microphone permission denied, device missing, or the stream failed.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The speech-to-text call failed (network, quota, format).
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The note-generation call failed.
    #[error("note generation failed: {0}")]
    GenerationFailed(String),

    /// Caller violated an input contract (empty artifact, empty source text,
    /// illegal transition, or a second call while one is in flight).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal invariant violation: a timer or handle was not released.
    /// Should never occur; guarded by tests.
    #[error("resource leak: {0}")]
    ResourceLeak(String),

    /// Filesystem plumbing (playback temp file, export).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TabibError>;
