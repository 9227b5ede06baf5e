//! The interactive recording pipeline.
//!
//! Drives the session state machine from a TUI loop: keyboard input and
//! timer ticks are delivered to the session as messages, external calls are
//! spawned and polled with a busy spinner, and every exit path funnels
//! through the session reset so the device, timers, and playback handle are
//! released deterministically. SIGUSR1 stops an active recording and
//! transcribes it, for external triggers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TabibConfig;
use crate::error::TabibError;
use crate::generation::{DiagnosisGenerator, TextGenApi};
use crate::note::NoteTemplate;
use crate::recording::{MicCapture, TabibTui, UiCommand};
use crate::session::{RecordingSession, SessionState, Settled};
use crate::transcription::{SpeechApi, TranscriptionClient};
use crate::ui::ErrorScreen;

/// Handles the default interactive pipeline.
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== tabib recording pipeline started ===");

    let config_data = match TabibConfig::load_or_init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/tabib/tabib.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, language={}",
        config_data.audio.device,
        config_data.audio.sample_rate,
        config_data.transcription.language
    );

    let template = NoteTemplate::new(config_data.note.sections.clone());

    let capture = MicCapture::new(
        config_data.audio.sample_rate,
        config_data.audio.device.clone(),
        config_data.audio.reference_level_db,
    );
    let mut session = RecordingSession::new(Box::new(capture));

    let mut tui = TabibTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    // External trigger: SIGUSR1 stops an active recording and transcribes it.
    let trigger = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&trigger))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut last_second = Instant::now();
    let mut last_wave = Instant::now();

    tracing::debug!("Entering pipeline loop");

    loop {
        // Timer ticks are messages into the state machine; the session
        // ignores them outside Recording.
        if session.state() == SessionState::Recording {
            while last_second.elapsed() >= Duration::from_secs(1) {
                session.tick_second();
                last_second += Duration::from_secs(1);
            }
            if last_wave.elapsed() >= Duration::from_millis(100) {
                session.tick_waveform();
                last_wave = Instant::now();
            }
        }

        if trigger.swap(false, Ordering::Relaxed) && session.state() == SessionState::Recording {
            tracing::info!("Received SIGUSR1: stopping and transcribing");
            if let Err(e) = session.stop() {
                tui.notify(format!("Xatolik: {e}"), true);
            } else {
                run_transcription(&mut session, &mut tui, &config_data).await?;
            }
        }

        tui.render(&session)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        match tui.handle_input() {
            Ok(UiCommand::Continue) => {}
            Ok(UiCommand::ToggleRecord) => match session.state() {
                SessionState::Idle => match session.record() {
                    Ok(()) => {
                        last_second = Instant::now();
                        last_wave = Instant::now();
                        tui.notify("Yozib olish boshlandi. Gapiring...", false);
                    }
                    Err(e) => {
                        tracing::error!("Failed to start recording: {}", e);
                        tui.notify(format!("Mikrofonga kirish imkoni yo'q: {e}"), true);
                    }
                },
                SessionState::Recording => match session.stop() {
                    Ok(()) => tui.notify("Yozib olish tugadi. Audio fayl tayyor.", false),
                    Err(e) => {
                        tracing::error!("Failed to stop recording: {}", e);
                        tui.notify(format!("Xatolik: {e}"), true);
                    }
                },
                SessionState::Stopped => {
                    tui.notify("Avval 'n' bilan sessiyani tozalang.", true);
                }
            },
            Ok(UiCommand::Transcribe) => {
                run_transcription(&mut session, &mut tui, &config_data).await?;
            }
            Ok(UiCommand::Generate) => {
                run_generation(&mut session, &mut tui, &config_data, &template).await?;
            }
            Ok(UiCommand::TogglePlay) => {
                if session.pause() {
                    // Playback flag cleared; the spawned player is not ours
                    // to stop.
                } else if session.play() {
                    if let Some(handle) = session.playback() {
                        if let Err(e) = handle.play() {
                            session.pause();
                            tui.notify(format!("Xatolik: {e}"), true);
                        }
                    }
                } else {
                    tui.notify("Ijro etish uchun yozuv yo'q.", true);
                }
            }
            Ok(UiCommand::Reset) => {
                session.reset();
                tui.notify("Sessiya tozalandi.", false);
            }
            Ok(UiCommand::Export) => match session.editor().export() {
                Ok(note) => {
                    let dir = match &config_data.note.export_dir {
                        Some(dir) => dir.clone(),
                        None => std::env::current_dir()?,
                    };
                    match note.write_to(&dir) {
                        Ok(path) => {
                            tracing::info!("Note exported to {}", path.display());
                            tui.notify(format!("Saqlandi: {}", path.display()), false);
                        }
                        Err(e) => tui.notify(format!("Xatolik: {e}"), true),
                    }
                }
                Err(e) => tui.notify(format!("Xatolik: {e}"), true),
            },
            Ok(UiCommand::Quit) => break,
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                session.reset();
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }
    }

    // Teardown: one cleanup routine for every exit path.
    session.reset();
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== tabib recording pipeline exited ===");
    Ok(())
}

/// Runs a transcription call against the stopped recording, rendering a
/// spinner while it is in flight. Contract violations and call failures are
/// surfaced as notifications, never as process errors.
async fn run_transcription(
    session: &mut RecordingSession,
    tui: &mut TabibTui,
    config_data: &TabibConfig,
) -> anyhow::Result<()> {
    let (artifact, token) = match session.begin_transcription() {
        Ok(v) => v,
        Err(e) => {
            tui.notify(format!("Xatolik: {e}"), true);
            return Ok(());
        }
    };

    let api_key = match TabibConfig::api_key(&config_data.transcription.api_key_env) {
        Ok(key) => key,
        Err(e) => {
            let err = TabibError::TranscriptionFailed(e.to_string());
            let _ = session.finish_transcription(token, Err(err));
            tui.notify(format!("Xatolik: {e}"), true);
            return Ok(());
        }
    };

    let client = SpeechApi::new(
        config_data.transcription.endpoint.clone(),
        config_data.transcription.model.clone(),
        api_key,
    );
    let language = config_data.transcription.language.clone();

    tracing::debug!("Starting transcription ({} bytes)", artifact.bytes().len());

    let handle = tokio::spawn(async move { client.transcribe(&artifact, &language).await });

    loop {
        tui.render_busy("Transkripsiya...")?;
        if handle.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let outcome = match handle.await {
        Ok(result) => result,
        Err(e) => Err(TabibError::TranscriptionFailed(format!(
            "transcription task failed: {e}"
        ))),
    };

    match session.finish_transcription(token, outcome) {
        Ok(Settled::Applied) => tui.notify("Transkripsiya tugadi. Matn tayyor.", false),
        Ok(Settled::Discarded) => tracing::debug!("Transcription result discarded after reset"),
        Err(e) => {
            tracing::warn!("Transcription failed: {}", e);
            tui.notify(format!("Xatolik: {e}"), true);
        }
    }

    Ok(())
}

/// Runs a note-generation call against the current transcript; same shape as
/// [`run_transcription`].
async fn run_generation(
    session: &mut RecordingSession,
    tui: &mut TabibTui,
    config_data: &TabibConfig,
    template: &NoteTemplate,
) -> anyhow::Result<()> {
    let (source, token) = match session.begin_generation() {
        Ok(v) => v,
        Err(e) => {
            tui.notify(format!("Xatolik: {e}"), true);
            return Ok(());
        }
    };

    let api_key = match TabibConfig::api_key(&config_data.generation.api_key_env) {
        Ok(key) => key,
        Err(e) => {
            let err = TabibError::GenerationFailed(e.to_string());
            let _ = session.finish_generation(token, Err(err));
            tui.notify(format!("Xatolik: {e}"), true);
            return Ok(());
        }
    };

    let client = TextGenApi::new(
        config_data.generation.endpoint.clone(),
        config_data.generation.model.clone(),
        api_key,
        config_data.generation.max_tokens,
    );
    let template = template.clone();

    tracing::debug!("Starting note generation ({} chars)", source.len());

    let handle = tokio::spawn(async move { client.generate(&source, &template).await });

    loop {
        tui.render_busy("Diagnoz yaratilmoqda...")?;
        if handle.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let outcome = match handle.await {
        Ok(result) => result,
        Err(e) => Err(TabibError::GenerationFailed(format!(
            "generation task failed: {e}"
        ))),
    };

    match session.finish_generation(token, outcome) {
        Ok(Settled::Applied) => tui.notify("Diagnoz yaratildi. Tibbiy hujjat tayyor.", false),
        Ok(Settled::Discarded) => tracing::debug!("Generation result discarded after reset"),
        Err(e) => {
            tracing::warn!("Note generation failed: {}", e);
            tui.notify(format!("Xatolik: {e}"), true);
        }
    }

    Ok(())
}
