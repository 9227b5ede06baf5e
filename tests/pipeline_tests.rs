//! End-to-end pipeline tests with mocked external services.
//!
//! The HTTP clients are replaced by in-process mocks behind the same traits;
//! the session, template, and editor run the real code.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tabib::generation::DiagnosisGenerator;
use tabib::note::{default_section_labels, NoteTemplate};
use tabib::recording::{AudioArtifact, AudioCapture};
use tabib::session::{RecordingSession, Settled};
use tabib::transcription::TranscriptionClient;
use tabib::{Result, TabibError};

struct SilentCapture {
    active: bool,
}

impl AudioCapture for SilentCapture {
    fn start(&mut self) -> Result<()> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<AudioArtifact>> {
        if !self.active {
            return Ok(None);
        }
        self.active = false;
        Ok(Some(AudioArtifact::from_samples(&[50i16; 800], 16000)?))
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn level(&self) -> u8 {
        10
    }
}

/// Transcription mock: returns a fixed Uzbek dictation and records how many
/// bytes of audio it was handed.
struct FixedTranscriber {
    text: String,
    calls: AtomicUsize,
    last_audio_len: AtomicUsize,
    last_language: Mutex<String>,
}

impl FixedTranscriber {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
            last_audio_len: AtomicUsize::new(0),
            last_language: Mutex::new(String::new()),
        }
    }
}

#[async_trait]
impl TranscriptionClient for FixedTranscriber {
    async fn transcribe(&self, audio: &AudioArtifact, language_hint: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_audio_len
            .store(audio.bytes().len(), Ordering::SeqCst);
        *self.last_language.lock().unwrap() = language_hint.to_string();
        Ok(self.text.clone())
    }
}

/// Generation mock: renders a note with every template section in order and
/// echoes the dictation into the complaints section.
struct TemplatedGenerator;

#[async_trait]
impl DiagnosisGenerator for TemplatedGenerator {
    async fn generate(&self, source_text: &str, template: &NoteTemplate) -> Result<String> {
        let mut note = String::new();
        for (i, section) in template.section_labels().iter().enumerate() {
            note.push_str(&format!("**{section}:**\n"));
            if i == 0 {
                note.push_str(source_text);
            } else {
                note.push_str("ma'lumot yo'q");
            }
            note.push('\n');
        }
        Ok(note)
    }
}

struct FailingTranscriber;

#[async_trait]
impl TranscriptionClient for FailingTranscriber {
    async fn transcribe(&self, _audio: &AudioArtifact, _language_hint: &str) -> Result<String> {
        Err(TabibError::TranscriptionFailed(
            "Rate limit exceeded. Please wait a moment and try again".to_string(),
        ))
    }
}

fn fresh_session() -> RecordingSession {
    RecordingSession::new(Box::new(SilentCapture { active: false }))
}

#[tokio::test]
async fn dictation_flows_through_transcription_into_a_structured_note() {
    let mut session = fresh_session();
    session.record().unwrap();
    session.stop().unwrap();

    let transcriber = Arc::new(FixedTranscriber::new(
        "bemorda yurak og'rig'i va nafas qisishi bor",
    ));
    let template = NoteTemplate::default();
    let generator = TemplatedGenerator;

    // transcription leg
    let (artifact, token) = session.begin_transcription().unwrap();
    let outcome = transcriber.transcribe(&artifact, "uz").await;
    assert_eq!(
        session.finish_transcription(token, outcome).unwrap(),
        Settled::Applied
    );
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        transcriber.last_audio_len.load(Ordering::SeqCst),
        artifact.bytes().len()
    );
    assert_eq!(*transcriber.last_language.lock().unwrap(), "uz");

    // generation leg
    let (source, token) = session.begin_generation().unwrap();
    assert_eq!(source, "bemorda yurak og'rig'i va nafas qisishi bor");
    let outcome = generator.generate(&source, &template).await;
    assert_eq!(
        session.finish_generation(token, outcome).unwrap(),
        Settled::Applied
    );

    let note = session.editor().diagnosis().unwrap();
    assert!(template.contains_all_sections(&note.text));
    assert!(note.text.contains("yurak og'rig'i"));

    // all seven default headings survive into the exported file
    let exported = session.editor().export().unwrap();
    for label in default_section_labels() {
        assert!(exported.contents.contains(&label), "missing {label}");
    }
}

#[tokio::test]
async fn edited_transcript_is_what_generation_sees() {
    let mut session = fresh_session();
    session.record().unwrap();
    session.stop().unwrap();

    let transcriber = FixedTranscriber::new("bosh og'rig'i");
    let (artifact, token) = session.begin_transcription().unwrap();
    let outcome = transcriber.transcribe(&artifact, "uz").await;
    session.finish_transcription(token, outcome).unwrap();

    session
        .editor_mut()
        .edit_transcript("bosh og'rig'i, uch kundan beri".to_string());

    let (source, token) = session.begin_generation().unwrap();
    assert_eq!(source, "bosh og'rig'i, uch kundan beri");
    let outcome = TemplatedGenerator.generate(&source, &NoteTemplate::default()).await;
    session.finish_generation(token, outcome).unwrap();
    assert!(session
        .editor()
        .diagnosis()
        .unwrap()
        .text
        .contains("uch kundan beri"));
}

#[tokio::test]
async fn failed_transcription_leaves_the_session_retryable() {
    let mut session = fresh_session();
    session.record().unwrap();
    session.stop().unwrap();

    let (artifact, token) = session.begin_transcription().unwrap();
    let outcome = FailingTranscriber.transcribe(&artifact, "uz").await;
    let err = session.finish_transcription(token, outcome).unwrap_err();
    assert!(matches!(err, TabibError::TranscriptionFailed(_)));
    assert!(err.to_string().contains("Rate limit"));

    // artifact untouched, retry with a working client succeeds
    let transcriber = FixedTranscriber::new("qayta urinish matni");
    let (artifact, token) = session.begin_transcription().unwrap();
    let outcome = transcriber.transcribe(&artifact, "uz").await;
    assert_eq!(
        session.finish_transcription(token, outcome).unwrap(),
        Settled::Applied
    );
    assert_eq!(session.editor().transcript().unwrap().text, "qayta urinish matni");
}

#[tokio::test]
async fn custom_section_layout_drives_prompt_and_verification() {
    let sections = vec![
        "Shikoyatlar".to_string(),
        "Xulosa".to_string(),
    ];
    let template = NoteTemplate::new(sections);

    let prompt = template.prompt_for("tomoq og'rig'i");
    assert!(prompt.contains("tomoq og'rig'i"));
    assert!(prompt.contains("**Shikoyatlar:**"));
    assert!(prompt.contains("**Xulosa:**"));

    let note = TemplatedGenerator
        .generate("tomoq og'rig'i", &template)
        .await
        .unwrap();
    assert!(template.contains_all_sections(&note));

    // a default seven-section template must not accept the two-section note
    assert!(!NoteTemplate::default().contains_all_sections(&note));
}
