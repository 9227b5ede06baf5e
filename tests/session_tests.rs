//! Session state machine tests against a scripted capture device.
//!
//! `FakeCapture` stands in for the microphone so every transition, timer
//! message, and teardown path can be exercised deterministically.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tabib::recording::{AudioArtifact, AudioCapture};
use tabib::session::{RecordingSession, SessionState, Settled, WAVEFORM_LEN};
use tabib::TabibError;

/// Scripted capture device. Counts lifecycle calls through shared atomics so
/// tests can observe device acquisition and release after the session owns
/// the box.
struct FakeCapture {
    active: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    fail_start: bool,
    fail_stop: bool,
    level: u8,
}

#[derive(Clone)]
struct CaptureProbe {
    active: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl CaptureProbe {
    fn device_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl FakeCapture {
    fn new() -> (Self, CaptureProbe) {
        let active = Arc::new(AtomicBool::new(false));
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let probe = CaptureProbe {
            active: Arc::clone(&active),
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
        };
        (
            Self {
                active,
                starts,
                stops,
                fail_start: false,
                fail_stop: false,
                level: 42,
            },
            probe,
        )
    }

    fn failing_start() -> Self {
        let (mut capture, _) = Self::new();
        capture.fail_start = true;
        capture
    }

    fn failing_stop() -> (Self, CaptureProbe) {
        let (mut capture, probe) = Self::new();
        capture.fail_stop = true;
        (capture, probe)
    }
}

impl AudioCapture for FakeCapture {
    fn start(&mut self) -> tabib::Result<()> {
        if self.fail_start {
            return Err(TabibError::DeviceUnavailable("mic is busy".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> tabib::Result<Option<AudioArtifact>> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(TabibError::DeviceUnavailable(
                "device vanished mid-recording".to_string(),
            ));
        }
        Ok(Some(
            AudioArtifact::from_samples(&[100i16; 1600], 16000).unwrap(),
        ))
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn level(&self) -> u8 {
        self.level
    }
}

fn session_with_probe() -> (RecordingSession, CaptureProbe) {
    let (capture, probe) = FakeCapture::new();
    (RecordingSession::new(Box::new(capture)), probe)
}

// Brings a session to Stopped with a finished artifact.
fn stopped_session() -> (RecordingSession, CaptureProbe) {
    let (mut session, probe) = session_with_probe();
    session.record().unwrap();
    session.stop().unwrap();
    (session, probe)
}

#[test]
fn full_pipeline_record_transcribe_generate_export() {
    let (mut session, probe) = session_with_probe();
    assert_eq!(session.state(), SessionState::Idle);

    session.record().unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    assert!(probe.device_active());

    for _ in 0..3 {
        session.tick_second();
    }
    for _ in 0..10 {
        session.tick_waveform();
    }
    assert_eq!(session.elapsed_secs(), 3);
    assert!(!session.waveform().is_zeroed());

    session.stop().unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!probe.device_active());
    assert!(session.artifact().is_some());
    // elapsed time stays visible after stopping
    assert_eq!(session.elapsed_secs(), 3);

    let (artifact, token) = session.begin_transcription().unwrap();
    assert!(!artifact.is_empty());
    assert_eq!(
        session
            .finish_transcription(token, Ok("yurak og'rig'i bor".to_string()))
            .unwrap(),
        Settled::Applied
    );
    assert_eq!(
        session.editor().transcript().unwrap().text,
        "yurak og'rig'i bor"
    );

    let (source, token) = session.begin_generation().unwrap();
    assert_eq!(source, "yurak og'rig'i bor");
    assert_eq!(
        session
            .finish_generation(token, Ok("**Shikoyatlar:**\nyurak og'rig'i".to_string()))
            .unwrap(),
        Settled::Applied
    );

    let note = session.editor().export().unwrap();
    assert!(note.filename.starts_with("diagnoz-"));
    assert!(note.contents.contains("yurak og'rig'i"));
}

#[test]
fn record_is_legal_only_from_idle() {
    let (mut session, _) = session_with_probe();
    session.record().unwrap();
    assert!(matches!(
        session.record(),
        Err(TabibError::InvalidInput(_))
    ));

    session.stop().unwrap();
    // Stopped requires an explicit reset before a new recording
    assert!(matches!(
        session.record(),
        Err(TabibError::InvalidInput(_))
    ));

    session.reset();
    session.record().unwrap();
    assert_eq!(session.state(), SessionState::Recording);
}

#[test]
fn failed_device_start_leaves_session_idle() {
    let mut session = RecordingSession::new(Box::new(FakeCapture::failing_start()));
    assert!(matches!(
        session.record(),
        Err(TabibError::DeviceUnavailable(_))
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.device_active());
}

#[test]
fn failed_finalization_falls_back_to_idle_without_artifact() {
    let (capture, probe) = FakeCapture::failing_stop();
    let mut session = RecordingSession::new(Box::new(capture));
    session.record().unwrap();
    assert!(matches!(
        session.stop(),
        Err(TabibError::DeviceUnavailable(_))
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.artifact().is_none());
    assert!(!probe.device_active());
}

#[test]
fn stop_outside_recording_is_a_noop() {
    let (mut session, probe) = session_with_probe();
    session.stop().unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(probe.stops(), 0);
}

#[test]
fn ticks_are_ignored_outside_recording() {
    let (mut session, _) = stopped_session();
    let elapsed = session.elapsed_secs();
    session.tick_second();
    session.tick_waveform();
    assert_eq!(session.elapsed_secs(), elapsed);
    assert!(session.waveform().is_zeroed());
}

#[test]
fn waveform_zeroes_on_stop_and_has_fixed_length() {
    let (mut session, _) = session_with_probe();
    session.record().unwrap();
    for _ in 0..WAVEFORM_LEN {
        session.tick_waveform();
    }
    assert!(!session.waveform().is_zeroed());
    assert_eq!(session.waveform().frame().len(), WAVEFORM_LEN);

    session.stop().unwrap();
    assert!(session.waveform().is_zeroed());
}

#[test]
fn second_recording_cycle_starts_from_a_clean_slate() {
    let (mut session, probe) = stopped_session();
    let (_, token) = session.begin_transcription().unwrap();
    session
        .finish_transcription(token, Ok("birinchi".to_string()))
        .unwrap();

    session.reset();
    session.record().unwrap();
    assert_eq!(session.elapsed_secs(), 0);
    assert!(session.editor().transcript().is_none());
    assert_eq!(probe.starts(), 2);
}

#[test]
fn reset_clears_everything_and_releases_the_device() {
    let (mut session, probe) = session_with_probe();
    session.record().unwrap();
    session.tick_second();
    session.tick_waveform();

    // Reset during an active recording releases the device too.
    session.reset();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!probe.device_active());
    assert_eq!(session.elapsed_secs(), 0);
    assert!(session.waveform().is_zeroed());
    assert!(session.artifact().is_none());
    assert!(session.playback().is_none());
    assert!(session.editor().transcript().is_none());
    assert!(session.editor().diagnosis().is_none());
    assert!(!session.is_playing());
}

#[test]
fn reset_revokes_the_playback_handle_file() {
    let (mut session, _) = stopped_session();
    let path = session.playback().unwrap().path().to_path_buf();
    assert!(path.exists());

    session.reset();
    assert!(!path.exists());
}

#[test]
fn stopping_a_new_recording_supersedes_the_old_playback_handle() {
    let (mut session, _) = stopped_session();
    let first = session.playback().unwrap().path().to_path_buf();

    session.reset();
    session.record().unwrap();
    session.stop().unwrap();
    let second = session.playback().unwrap().path().to_path_buf();

    assert_ne!(first, second);
    assert!(!first.exists());
    assert!(second.exists());
}

#[test]
fn play_pause_toggle_only_in_stopped_with_artifact() {
    let (mut session, _) = session_with_probe();
    assert!(!session.play());

    session.record().unwrap();
    assert!(!session.play());

    session.stop().unwrap();
    assert!(session.play());
    assert!(session.is_playing());
    // already playing
    assert!(!session.play());
    assert!(session.pause());
    assert!(!session.is_playing());
    assert!(!session.pause());
}

#[test]
fn transcription_without_artifact_is_rejected() {
    let (mut session, _) = session_with_probe();
    assert!(matches!(
        session.begin_transcription(),
        Err(TabibError::InvalidInput(_))
    ));
}

#[test]
fn only_one_call_of_a_kind_in_flight() {
    let (mut session, _) = stopped_session();
    let (_, token) = session.begin_transcription().unwrap();
    assert!(matches!(
        session.begin_transcription(),
        Err(TabibError::InvalidInput(_))
    ));

    session.finish_transcription(token, Ok("matn".to_string())).unwrap();
    // settled, a new call may begin
    assert!(session.begin_transcription().is_ok());
}

#[test]
fn generation_requires_a_nonempty_transcript() {
    let (mut session, _) = stopped_session();
    assert!(matches!(
        session.begin_generation(),
        Err(TabibError::InvalidInput(_))
    ));

    let (_, token) = session.begin_transcription().unwrap();
    session.finish_transcription(token, Ok("   ".to_string())).unwrap();
    assert!(matches!(
        session.begin_generation(),
        Err(TabibError::InvalidInput(_))
    ));
}

#[test]
fn failed_transcription_preserves_the_prior_transcript() {
    let (mut session, _) = stopped_session();
    let (_, token) = session.begin_transcription().unwrap();
    session
        .finish_transcription(token, Ok("birinchi matn".to_string()))
        .unwrap();

    let (_, token) = session.begin_transcription().unwrap();
    let err = session
        .finish_transcription(
            token,
            Err(TabibError::TranscriptionFailed("timeout".to_string())),
        )
        .unwrap_err();
    assert!(matches!(err, TabibError::TranscriptionFailed(_)));
    assert_eq!(session.editor().transcript().unwrap().text, "birinchi matn");
    assert_eq!(session.state(), SessionState::Stopped);

    // failure settles the call; a retry may begin
    assert!(session.begin_transcription().is_ok());
}

#[test]
fn reset_during_in_flight_call_discards_the_late_result() {
    let (mut session, _) = stopped_session();
    let (_, token) = session.begin_transcription().unwrap();

    session.reset();

    // The late result lands on a fresh epoch and is discarded untouched.
    assert_eq!(
        session
            .finish_transcription(token, Ok("kech kelgan matn".to_string()))
            .unwrap(),
        Settled::Discarded
    );
    assert!(session.editor().transcript().is_none());
    assert_eq!(session.state(), SessionState::Idle);

    // The new session epoch works normally afterwards.
    session.record().unwrap();
    session.stop().unwrap();
    let (_, token) = session.begin_transcription().unwrap();
    assert_eq!(
        session
            .finish_transcription(token, Ok("yangi matn".to_string()))
            .unwrap(),
        Settled::Applied
    );
}

#[test]
fn stale_generation_result_is_discarded_too() {
    let (mut session, _) = stopped_session();
    let (_, token) = session.begin_transcription().unwrap();
    session
        .finish_transcription(token, Ok("shikoyat bor".to_string()))
        .unwrap();
    let (_, gen_token) = session.begin_generation().unwrap();

    session.reset();

    assert_eq!(
        session
            .finish_generation(gen_token, Ok("eski diagnoz".to_string()))
            .unwrap(),
        Settled::Discarded
    );
    assert!(session.editor().diagnosis().is_none());
}

#[test]
fn dropping_the_session_releases_the_device() {
    let probe = {
        let (mut session, probe) = session_with_probe();
        session.record().unwrap();
        assert!(probe.device_active());
        probe
    };
    assert!(!probe.device_active());
}

#[test]
fn dropping_the_session_removes_the_playback_file() {
    let path = {
        let (mut session, _) = stopped_session();
        session.playback().unwrap().path().to_path_buf()
    };
    assert!(!path.exists());
}
