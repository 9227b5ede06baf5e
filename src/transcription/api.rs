//! HTTP transcription client (Whisper-style multipart endpoint).

use serde::Deserialize;

use super::TranscriptionClient;
use crate::error::{Result, TabibError};
use crate::recording::AudioArtifact;

/// Unified response shape of transcription endpoints.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper-style speech-to-text client.
///
/// Uploads the WAV artifact as multipart form data with bearer token
/// authentication.
pub struct SpeechApi {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl SpeechApi {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            endpoint,
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl TranscriptionClient for SpeechApi {
    async fn transcribe(&self, audio: &AudioArtifact, language_hint: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(TabibError::InvalidInput(
                "cannot transcribe an empty artifact".to_string(),
            ));
        }

        let file_part = reqwest::multipart::Part::bytes(audio.bytes().to_vec())
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| {
                TabibError::TranscriptionFailed(format!("failed to build upload part: {e}"))
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", language_hint.to_string())
            .text("response_format", "json".to_string());

        tracing::debug!(
            "Transcription request: endpoint={}, model={}, language={}, {} bytes",
            self.endpoint,
            self.model,
            language_hint,
            audio.bytes().len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_connect() {
                    "failed to connect to the transcription server. Check your internet connection."
                        .to_string()
                } else if e.is_timeout() {
                    "transcription request timed out. The server is not responding.".to_string()
                } else {
                    format!("transcription network error: {e}")
                };
                TabibError::TranscriptionFailed(msg)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let human_readable = match status.as_u16() {
                401 => "the transcription API key is invalid or expired.".to_string(),
                403 => "the transcription service refused the request. Check your account status."
                    .to_string(),
                413 | 415 => "the recording format or size was rejected by the transcription service."
                    .to_string(),
                429 => "transcription rate limit reached. Please wait and try again.".to_string(),
                500 | 502 | 503 | 504 => {
                    "the transcription server is experiencing issues. Please try again later."
                        .to_string()
                }
                _ => format!("transcription API error (status {status}): {error_body}"),
            };

            return Err(TabibError::TranscriptionFailed(human_readable));
        }

        let transcription: TranscriptionResponse = response.json().await.map_err(|e| {
            TabibError::TranscriptionFailed(format!("failed to parse response: {e}"))
        })?;

        tracing::debug!(
            "Transcription response: {} characters",
            transcription.text.len()
        );

        Ok(transcription.text.trim().to_string())
    }
}
