//! Note-generation capability port.
//!
//! Turns a symptom transcript into a structured diagnosis note through an
//! external generative-text service. Injectable and mockable, same shape as
//! the transcription port.

pub mod api;

pub use api::TextGenApi;

use crate::error::Result;
use crate::note::NoteTemplate;

/// External generation capability: source text plus a note template in,
/// section-structured text out.
#[async_trait::async_trait]
pub trait DiagnosisGenerator: Send + Sync {
    /// Generates a diagnosis note from the transcript text.
    ///
    /// # Errors
    /// - `InvalidInput` if the source text is empty
    /// - `GenerationFailed` on network or service errors
    async fn generate(&self, source_text: &str, template: &NoteTemplate) -> Result<String>;
}
