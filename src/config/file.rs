//! Configuration file management.
//!
//! Configuration lives at `~/.config/tabib/tabib.toml`. On first run a
//! default file is written so the user has something concrete to edit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::note::template::default_section_labels;

/// Audio recording configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device: "default", a numeric index, or a device name
    /// (see `tabib list-devices`).
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz (the device's native rate wins).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Reference level in dBFS mapped to 100% on the input meter.
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_reference_level_db() -> i8 {
    -20
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            reference_level_db: default_reference_level_db(),
        }
    }
}

/// Speech-to-text service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcription endpoint URL.
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,
    /// Model name sent with the request.
    #[serde(default = "default_transcription_model")]
    pub model: String,
    /// Language hint (ISO 639-1), passed through to the service.
    #[serde(default = "default_language")]
    pub language: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_transcription_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_language() -> String {
    "uz".to_string()
}

fn default_api_key_env() -> String {
    "TABIB_API_KEY".to_string()
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            model: default_transcription_model(),
            language: default_language(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Generative-text service configuration for diagnosis notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completion endpoint URL.
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,
    /// Model name sent with the request.
    #[serde(default = "default_generation_model")]
    pub model: String,
    /// Token budget for the generated note.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_generation_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            model: default_generation_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Diagnosis note layout and export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteConfig {
    /// Ordered section headings of the generated note.
    #[serde(default = "default_section_labels")]
    pub sections: Vec<String>,
    /// Directory exported notes are written to. Defaults to the current
    /// working directory when unset.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            sections: default_section_labels(),
            export_dir: None,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabibConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub note: NoteConfig,
}

impl TabibConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)?;
        let config: TabibConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Loads the configuration, writing a default file first if none exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If reading or writing the file fails, or the TOML is malformed
    pub fn load_or_init() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            let defaults = TabibConfig::default();
            defaults.save()?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            return Ok(defaults);
        }
        Self::load()
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Reads the API key for a service section from its environment variable.
    ///
    /// # Errors
    /// - If the variable is unset or empty
    pub fn api_key(env_name: &str) -> anyhow::Result<String> {
        match std::env::var(env_name) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(anyhow::anyhow!(
                "No API key found. Set the {env_name} environment variable."
            )),
        }
    }
}

/// Retrieves the path to the config file, creating parent directories.
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    let config_path = home.join(".config").join("tabib").join("tabib.toml");

    fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = TabibConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: TabibConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.audio.sample_rate, 16000);
        assert_eq!(parsed.transcription.language, "uz");
        assert_eq!(parsed.generation.max_tokens, 1000);
        assert_eq!(parsed.note.sections.len(), 7);
    }

    #[test]
    fn empty_file_uses_all_defaults() {
        let parsed: TabibConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.transcription.model, "whisper-1");
        assert_eq!(parsed.generation.model, "gpt-4o-mini");
        assert!(parsed.note.export_dir.is_none());
    }
}
