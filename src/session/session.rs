//! The recording session state machine.
//!
//! Owns the microphone capture port, the finalized artifact and its playback
//! handle, the waveform sampler, and the editable results. All transition
//! legality is checked here; timer ticks and async call completions arrive as
//! messages so nothing outside this type mutates session state.
//!
//! Asynchronous calls use a begin/finish protocol: `begin_*` validates the
//! transition, marks the call in flight, and hands the caller the input plus
//! a [`CallToken`] stamped with the current epoch. `finish_*` applies the
//! outcome unless the session was reset in the meantime, in which case the
//! stale result is discarded.

use crate::error::{Result, TabibError};
use crate::note::{DiagnosisDocument, ResultEditor, TranscriptResult};
use crate::recording::{AudioArtifact, AudioCapture};

use super::playback::PlaybackHandle;
use super::waveform::WaveformSampler;

/// Top-level session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

/// Epoch stamp handed out by `begin_*`, passed back to `finish_*`.
#[derive(Debug, Clone, Copy)]
pub struct CallToken {
    epoch: u64,
}

/// How a finished async call was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The result was applied to the session.
    Applied,
    /// The session was reset while the call was in flight; the result was
    /// discarded.
    Discarded,
}

pub struct RecordingSession {
    state: SessionState,
    elapsed_secs: u64,
    waveform: WaveformSampler,
    capture: Box<dyn AudioCapture>,
    artifact: Option<AudioArtifact>,
    playback: Option<PlaybackHandle>,
    editor: ResultEditor,
    /// Playback flag; meaningful only in `Stopped`.
    playing: bool,
    /// Bumped on every reset; stale in-flight results carry an older epoch.
    epoch: u64,
    transcribing: bool,
    generating: bool,
}

impl RecordingSession {
    pub fn new(capture: Box<dyn AudioCapture>) -> Self {
        Self {
            state: SessionState::Idle,
            elapsed_secs: 0,
            waveform: WaveformSampler::new(),
            capture,
            artifact: None,
            playback: None,
            editor: ResultEditor::default(),
            playing: false,
            epoch: 0,
            transcribing: false,
            generating: false,
        }
    }

    // Accessors

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn waveform(&self) -> &WaveformSampler {
        &self.waveform
    }

    pub fn artifact(&self) -> Option<&AudioArtifact> {
        self.artifact.as_ref()
    }

    pub fn playback(&self) -> Option<&PlaybackHandle> {
        self.playback.as_ref()
    }

    pub fn editor(&self) -> &ResultEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ResultEditor {
        &mut self.editor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_transcribing(&self) -> bool {
        self.transcribing
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Whether the capture device is currently held open.
    pub fn device_active(&self) -> bool {
        self.capture.is_active()
    }

    // Transitions

    /// `Idle -> Recording`: acquires the device, starts the waveform sampler
    /// and zeroes the elapsed counter.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if capture cannot start; the session stays Idle
    /// - `InvalidInput` when not in Idle
    pub fn record(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(TabibError::InvalidInput(format!(
                "cannot start recording in {:?} state",
                self.state
            )));
        }

        self.capture.start()?;

        self.state = SessionState::Recording;
        self.elapsed_secs = 0;
        self.playing = false;
        self.waveform.begin();
        tracing::info!("Session: recording started");
        Ok(())
    }

    /// `Recording -> Stopped`: releases the device, finalizes the artifact
    /// and produces a fresh playback handle. A no-op outside Recording.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if finalization fails; the session falls back to
    ///   Idle with the device released and no artifact
    pub fn stop(&mut self) -> Result<()> {
        if self.state != SessionState::Recording {
            return Ok(());
        }

        self.waveform.end();

        let artifact = match self.capture.stop() {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                self.state = SessionState::Idle;
                return Err(TabibError::DeviceUnavailable(
                    "capture was not active".to_string(),
                ));
            }
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };

        if let Some(mut old) = self.playback.take() {
            old.revoke();
        }
        match PlaybackHandle::new(&artifact) {
            Ok(handle) => self.playback = Some(handle),
            Err(e) => {
                // Playback is a convenience; the artifact itself is intact.
                tracing::warn!("Failed to create playback handle: {}", e);
            }
        }

        tracing::info!("Session: recording stopped ({:.2}s)", artifact.duration_secs());
        self.artifact = Some(artifact);
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// `* -> Idle`: the single cleanup routine. Releases the device if still
    /// recording, revokes the playback handle exactly once, discards the
    /// artifact and both result texts, zeroes elapsed time and waveform, and
    /// bumps the epoch so in-flight call results are discarded on arrival.
    pub fn reset(&mut self) {
        if self.state == SessionState::Recording {
            if let Err(e) = self.capture.stop() {
                tracing::warn!("Failed to release capture during reset: {}", e);
            }
        }
        self.waveform.end();
        if let Some(mut handle) = self.playback.take() {
            handle.revoke();
        }
        self.artifact = None;
        self.editor.clear();
        self.elapsed_secs = 0;
        self.playing = false;
        self.transcribing = false;
        self.generating = false;
        self.epoch += 1;
        self.state = SessionState::Idle;
        tracing::debug!("Session: reset to Idle (epoch {})", self.epoch);
    }

    // Timer messages

    /// One-second elapsed tick; ignored outside Recording.
    pub fn tick_second(&mut self) {
        if self.state == SessionState::Recording {
            self.elapsed_secs += 1;
        }
    }

    /// Waveform sampling tick (~100ms); ignored outside Recording.
    pub fn tick_waveform(&mut self) {
        if self.state == SessionState::Recording {
            let level = self.capture.level();
            self.waveform.tick(level);
        }
    }

    // Playback flag

    /// Marks playback started. Legal only in Stopped with an artifact;
    /// returns whether the flag changed.
    pub fn play(&mut self) -> bool {
        if self.state == SessionState::Stopped && self.artifact.is_some() && !self.playing {
            self.playing = true;
            return true;
        }
        false
    }

    /// Marks playback paused; returns whether the flag changed.
    pub fn pause(&mut self) -> bool {
        if self.playing {
            self.playing = false;
            return true;
        }
        false
    }

    // Async call protocol

    /// Validates and registers a transcription call.
    ///
    /// # Errors
    /// - `InvalidInput` if there is no artifact or a call is already in
    ///   flight
    pub fn begin_transcription(&mut self) -> Result<(AudioArtifact, CallToken)> {
        if self.transcribing {
            return Err(TabibError::InvalidInput(
                "a transcription call is already in flight".to_string(),
            ));
        }
        let artifact = self.artifact.as_ref().ok_or_else(|| {
            TabibError::InvalidInput("no recorded artifact to transcribe".to_string())
        })?;

        self.transcribing = true;
        Ok((artifact.clone(), CallToken { epoch: self.epoch }))
    }

    /// Applies a finished transcription call.
    ///
    /// A stale token (session reset since `begin`) discards the outcome
    /// without touching any state. On failure the prior transcript is
    /// preserved unchanged and the error is propagated; the session stays in
    /// Stopped.
    pub fn finish_transcription(
        &mut self,
        token: CallToken,
        outcome: Result<String>,
    ) -> Result<Settled> {
        if token.epoch != self.epoch {
            tracing::debug!("Discarding stale transcription result");
            return Ok(Settled::Discarded);
        }
        self.transcribing = false;
        match outcome {
            Ok(text) => {
                tracing::info!("Transcription applied ({} chars)", text.len());
                self.editor.set_transcript(TranscriptResult::new(text));
                Ok(Settled::Applied)
            }
            Err(e) => Err(e),
        }
    }

    /// Validates and registers a note-generation call, returning the source
    /// text to generate from.
    ///
    /// # Errors
    /// - `InvalidInput` if the transcript is empty or a call is already in
    ///   flight
    pub fn begin_generation(&mut self) -> Result<(String, CallToken)> {
        if self.generating {
            return Err(TabibError::InvalidInput(
                "a generation call is already in flight".to_string(),
            ));
        }
        let source = self
            .editor
            .transcript()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        if source.trim().is_empty() {
            return Err(TabibError::InvalidInput(
                "transcript is empty; nothing to generate from".to_string(),
            ));
        }

        self.generating = true;
        Ok((source, CallToken { epoch: self.epoch }))
    }

    /// Applies a finished generation call; same staleness and failure rules
    /// as [`finish_transcription`](Self::finish_transcription).
    pub fn finish_generation(
        &mut self,
        token: CallToken,
        outcome: Result<String>,
    ) -> Result<Settled> {
        if token.epoch != self.epoch {
            tracing::debug!("Discarding stale generation result");
            return Ok(Settled::Discarded);
        }
        self.generating = false;
        match outcome {
            Ok(text) => {
                tracing::info!("Diagnosis note applied ({} chars)", text.len());
                self.editor.set_diagnosis(DiagnosisDocument::new(text));
                Ok(Settled::Applied)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        // Teardown path: make sure the device and the playback file are
        // released no matter how the driving loop exited.
        if self.state == SessionState::Recording {
            if let Err(e) = self.capture.stop() {
                tracing::warn!("Failed to release capture on teardown: {}", e);
            }
        }
        if let Some(mut handle) = self.playback.take() {
            handle.revoke();
        }
    }
}
