//! Configuration management for tabib.
//!
//! Loads and saves application configuration from a TOML file in the user's
//! config directory. API keys are never stored in the file; each service
//! section names the environment variable to read the key from.

pub mod file;

pub use file::{
    AudioConfig, GenerationConfig, NoteConfig, TabibConfig, TranscriptionConfig,
};
