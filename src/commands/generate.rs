//! Generate a structured diagnosis note from a transcript file.
//!
//! Reads clinician dictation text from a file (or stdin) and runs it through
//! the configured text-generation endpoint with the section template, without
//! going through the interactive pipeline.

use std::io::Read;
use std::path::PathBuf;

use crate::config::TabibConfig;
use crate::generation::{DiagnosisGenerator, TextGenApi};
use crate::note::NoteTemplate;

/// Handles one-shot note generation from a transcript file.
///
/// # Arguments
/// * `file` - Path to the transcript text file, or `-` for stdin
/// * `output_file` - Optional file path to write the note to instead of stdout
pub async fn handle_generate(
    file: PathBuf,
    output_file: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== tabib generate command ===");

    let config_data = TabibConfig::load_or_init()
        .map_err(|err| anyhow::anyhow!("Configuration error: {err}"))?;

    let source = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(&file)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", file.display()))?
    };

    tracing::debug!("Generating note from {} chars of dictation", source.len());

    let template = NoteTemplate::new(config_data.note.sections.clone());

    let api_key = TabibConfig::api_key(&config_data.generation.api_key_env)?;
    let client = TextGenApi::new(
        config_data.generation.endpoint.clone(),
        config_data.generation.model.clone(),
        api_key,
        config_data.generation.max_tokens,
    );

    let note = client.generate(&source, &template).await?;

    match output_file {
        Some(path) => {
            std::fs::write(&path, &note)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
            tracing::info!("Note written to {}", path.display());
            println!("Note written to {}", path.display());
        }
        None => println!("{note}"),
    }

    Ok(())
}
