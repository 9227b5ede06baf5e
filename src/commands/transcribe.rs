//! Transcribe a pre-recorded audio file without recording.
//!
//! Accepts a WAV file path and transcribes it with the configured speech
//! endpoint, reusing the same client as the interactive pipeline.

use std::path::PathBuf;

use crate::config::TabibConfig;
use crate::recording::AudioArtifact;
use crate::transcription::{SpeechApi, TranscriptionClient};

/// Handles transcription of a pre-recorded audio file.
///
/// # Arguments
/// * `file` - Path to the WAV file to transcribe
/// * `output_file` - Optional file path to write the transcript to instead of stdout
pub async fn handle_transcribe(
    file: PathBuf,
    output_file: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== tabib transcribe command ===");
    tracing::info!("Transcribing file: {}", file.display());

    let config_data = TabibConfig::load_or_init()
        .map_err(|err| anyhow::anyhow!("Configuration error: {err}"))?;

    let artifact = AudioArtifact::from_file(&file)?;
    tracing::debug!(
        "Loaded {} bytes ({:.1}s of audio)",
        artifact.bytes().len(),
        artifact.duration_secs()
    );

    let api_key = TabibConfig::api_key(&config_data.transcription.api_key_env)?;
    let client = SpeechApi::new(
        config_data.transcription.endpoint.clone(),
        config_data.transcription.model.clone(),
        api_key,
    );

    let text = client
        .transcribe(&artifact, &config_data.transcription.language)
        .await?;

    match output_file {
        Some(path) => {
            std::fs::write(&path, &text)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
            tracing::info!("Transcript written to {}", path.display());
            println!("Transcript written to {}", path.display());
        }
        None => println!("{text}"),
    }

    Ok(())
}
