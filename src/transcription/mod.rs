//! Speech-to-text capability port.
//!
//! The session never talks to a provider directly; it goes through the
//! [`TranscriptionClient`] trait so tests can inject a mock and the HTTP
//! implementation stays swappable.

pub mod api;

pub use api::SpeechApi;

use crate::error::Result;
use crate::recording::AudioArtifact;

/// External transcription capability: audio bytes in, text out.
#[async_trait::async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Transcribes the artifact.
    ///
    /// # Errors
    /// - `InvalidInput` if the artifact is empty
    /// - `TranscriptionFailed` on network, quota, or format errors
    async fn transcribe(&self, audio: &AudioArtifact, language_hint: &str) -> Result<String>;
}
