//! Diagnosis note artifacts: transcript, generated document, editing, export.

pub mod editor;
pub mod template;

pub use editor::{DiagnosisDocument, ExportedNote, ResultEditor, TranscriptResult};
pub use template::{default_section_labels, NoteTemplate};
