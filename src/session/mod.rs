//! The recording session state machine and its owned resources.

pub mod playback;
pub mod session;
pub mod waveform;

pub use playback::PlaybackHandle;
pub use session::{CallToken, RecordingSession, SessionState, Settled};
pub use waveform::{WaveformSampler, WAVEFORM_LEN};
