//! HTTP note-generation client (chat-completion endpoint).

use serde::Deserialize;
use serde_json::json;

use super::DiagnosisGenerator;
use crate::error::{Result, TabibError};
use crate::note::NoteTemplate;

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Chat-completion client for diagnosis note generation.
pub struct TextGenApi {
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl TextGenApi {
    pub fn new(endpoint: String, model: String, api_key: String, max_tokens: u32) -> Self {
        Self {
            endpoint,
            model,
            api_key,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl DiagnosisGenerator for TextGenApi {
    async fn generate(&self, source_text: &str, template: &NoteTemplate) -> Result<String> {
        if source_text.trim().is_empty() {
            return Err(TabibError::InvalidInput(
                "cannot generate a note from empty source text".to_string(),
            ));
        }

        let prompt = template.prompt_for(source_text);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
        });

        tracing::debug!(
            "Generation request: endpoint={}, model={}, max_tokens={}",
            self.endpoint,
            self.model,
            self.max_tokens
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_connect() {
                    "failed to connect to the generation server. Check your internet connection."
                        .to_string()
                } else if e.is_timeout() {
                    "generation request timed out. The server is not responding.".to_string()
                } else {
                    format!("generation network error: {e}")
                };
                TabibError::GenerationFailed(msg)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let human_readable = match status.as_u16() {
                401 => "the generation API key is invalid or expired.".to_string(),
                403 => "the generation service refused the request. Check your account status."
                    .to_string(),
                429 => "generation rate limit reached. Please wait and try again.".to_string(),
                500 | 502 | 503 | 504 => {
                    "the generation server is experiencing issues. Please try again later."
                        .to_string()
                }
                _ => format!("generation API error (status {status}): {error_body}"),
            };

            return Err(TabibError::GenerationFailed(human_readable));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| TabibError::GenerationFailed(format!("failed to parse response: {e}")))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                TabibError::GenerationFailed("the service returned no completion".to_string())
            })?;

        if !template.contains_all_sections(&text) {
            tracing::warn!("Generated note is missing some template sections");
        }

        Ok(text.trim().to_string())
    }
}
