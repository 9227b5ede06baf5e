//! Microphone capture and the recording TUI.
//!
//! `AudioCapture` is the device port the session drives; `MicCapture` is the
//! cpal-backed implementation. The finalized recording is an in-memory WAV
//! blob (`AudioArtifact`).

pub mod artifact;
pub mod audio;
pub mod ui;

pub use artifact::AudioArtifact;
pub use audio::{AudioCapture, MicCapture};
pub use ui::{TabibTui, UiCommand};
