//! Application command handlers.
//!
//! Each submodule handles one CLI command:
//! - `record`: the interactive record/transcribe/generate/export pipeline
//! - `transcribe`: transcribe an existing audio file
//! - `generate`: generate a diagnosis note from text
//! - `config`: open the configuration file in the user's editor
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries

pub mod config;
pub mod generate;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod transcribe;

pub use config::handle_config;
pub use generate::handle_generate;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use transcribe::handle_transcribe;
