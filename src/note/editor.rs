//! Editable result artifacts of the pipeline and plain-text export.
//!
//! The editor holds the two derived texts (transcript and generated note) as
//! freely editable fields. Edits never round-trip through the external
//! services: editing the transcript leaves an already-generated note alone.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TabibError};

/// Transcript produced by a successful transcription call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptResult {
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

impl TranscriptResult {
    pub fn new(text: String) -> Self {
        Self {
            text,
            produced_at: Utc::now(),
        }
    }
}

/// Structured diagnosis note produced by a successful generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisDocument {
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

impl DiagnosisDocument {
    pub fn new(text: String) -> Self {
        Self {
            text,
            produced_at: Utc::now(),
        }
    }
}

/// A serialized note ready to be handed to the surrounding shell.
#[derive(Debug, Clone)]
pub struct ExportedNote {
    pub filename: String,
    pub contents: String,
}

impl ExportedNote {
    /// Writes the note into `dir` and returns the full path.
    ///
    /// # Errors
    /// - If the directory cannot be created or the file cannot be written
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.contents)?;
        Ok(path)
    }
}

/// Holds the transcript and diagnosis texts for review and editing.
#[derive(Debug, Default)]
pub struct ResultEditor {
    transcript: Option<TranscriptResult>,
    diagnosis: Option<DiagnosisDocument>,
}

impl ResultEditor {
    pub fn transcript(&self) -> Option<&TranscriptResult> {
        self.transcript.as_ref()
    }

    pub fn diagnosis(&self) -> Option<&DiagnosisDocument> {
        self.diagnosis.as_ref()
    }

    /// Installs a freshly produced transcript, replacing any prior one.
    pub fn set_transcript(&mut self, result: TranscriptResult) {
        self.transcript = Some(result);
    }

    /// Installs a freshly generated note, replacing any prior one.
    pub fn set_diagnosis(&mut self, document: DiagnosisDocument) {
        self.diagnosis = Some(document);
    }

    /// Replaces the transcript text with a user edit. No-op when there is no
    /// transcript to edit; `produced_at` is kept.
    pub fn edit_transcript(&mut self, text: String) {
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.text = text;
        }
    }

    /// Replaces the diagnosis text with a user edit. No-op when there is no
    /// note to edit; `produced_at` is kept.
    pub fn edit_diagnosis(&mut self, text: String) {
        if let Some(diagnosis) = self.diagnosis.as_mut() {
            diagnosis.text = text;
        }
    }

    /// Discards both artifacts.
    pub fn clear(&mut self) {
        self.transcript = None;
        self.diagnosis = None;
    }

    /// Serializes the current diagnosis text into an exportable note.
    ///
    /// Pure with respect to session state: nothing is mutated.
    ///
    /// # Errors
    /// - `InvalidInput` if there is no diagnosis or its text is empty
    pub fn export(&self) -> Result<ExportedNote> {
        let diagnosis = self
            .diagnosis
            .as_ref()
            .filter(|d| !d.text.trim().is_empty())
            .ok_or_else(|| {
                TabibError::InvalidInput("no diagnosis note to export".to_string())
            })?;

        let filename = format!(
            "diagnoz-{}.txt",
            diagnosis.produced_at.format("%Y-%m-%d-%H%M%S")
        );

        Ok(ExportedNote {
            filename,
            contents: diagnosis.text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_without_diagnosis_is_invalid_input() {
        let editor = ResultEditor::default();
        assert!(matches!(
            editor.export(),
            Err(TabibError::InvalidInput(_))
        ));
    }

    #[test]
    fn export_carries_diagnosis_text_and_timestamped_name() {
        let mut editor = ResultEditor::default();
        editor.set_diagnosis(DiagnosisDocument::new("**Shikoyatlar:**\nbosh og'rig'i".into()));
        let note = editor.export().unwrap();
        assert!(note.filename.starts_with("diagnoz-"));
        assert!(note.filename.ends_with(".txt"));
        assert!(note.contents.contains("bosh og'rig'i"));
    }

    #[test]
    fn editing_transcript_leaves_diagnosis_untouched() {
        let mut editor = ResultEditor::default();
        editor.set_transcript(TranscriptResult::new("yurak og'rig'i".into()));
        editor.set_diagnosis(DiagnosisDocument::new("nota".into()));
        editor.edit_transcript("ko'krak og'rig'i".into());
        assert_eq!(editor.transcript().unwrap().text, "ko'krak og'rig'i");
        assert_eq!(editor.diagnosis().unwrap().text, "nota");
    }

    #[test]
    fn edit_with_nothing_to_edit_is_a_noop() {
        let mut editor = ResultEditor::default();
        editor.edit_diagnosis("text".into());
        assert!(editor.diagnosis().is_none());
    }

    #[test]
    fn write_to_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let note = ExportedNote {
            filename: "diagnoz-test.txt".into(),
            contents: "matn".into(),
        };
        let path = note.write_to(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "matn");
    }
}
