//! tabib: terminal-based clinical voice scribe.
//!
//! Records a spoken patient encounter from the microphone, transcribes it via
//! an external speech-to-text service, and turns the transcript into a
//! structured diagnosis note via a generative-text service.
//!
//! The core of the crate is the [`session::RecordingSession`] state machine,
//! which owns the microphone device, the recorded artifact and its playback
//! handle, and coordinates the asynchronous transcription and generation
//! calls. Everything around it (CLI, TUI, config, logging) is plumbing.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod note;
pub mod recording;
pub mod session;
pub mod transcription;
pub mod ui;

pub use error::{Result, TabibError};
