//! Terminal user interface for the recording pipeline.
//!
//! Renders the session's 50-slot waveform frame as a sparkline, the elapsed
//! recording clock, previews of the transcript and the generated note, and a
//! status line for notifications. Input handling maps key presses to
//! pipeline commands.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Paragraph, Sparkline, Wrap},
};
use std::io::{stdout, Stdout};

use crate::session::{RecordingSession, SessionState};

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// User input command during the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// No key pressed, keep rendering
    Continue,
    /// Start or stop recording (Space)
    ToggleRecord,
    /// Transcribe the stopped recording (Enter)
    Transcribe,
    /// Generate the diagnosis note ('g')
    Generate,
    /// Play or pause the recording ('p')
    TogglePlay,
    /// Reset the session ('n')
    Reset,
    /// Export the diagnosis note ('e')
    Export,
    /// Exit ('q', Escape, Ctrl+C)
    Quit,
}

/// Terminal UI for the record/transcribe/generate/export workflow.
pub struct TabibTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: Option<(String, bool)>,
    spinner_tick: usize,
}

impl TabibTui {
    /// Creates the TUI and enters alternate screen mode.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized or raw mode enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(TabibTui {
            terminal,
            status: None,
            spinner_tick: 0,
        })
    }

    /// Shows a notification in the status line. Errors render in red.
    pub fn notify(&mut self, message: impl Into<String>, is_error: bool) {
        self.status = Some((message.into(), is_error));
    }

    /// Renders one frame of the session view.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, session: &RecordingSession) -> anyhow::Result<()> {
        let waveform: Vec<u64> = session.waveform().frame().iter().map(|&v| v as u64).collect();
        let state = session.state();
        let elapsed = session.elapsed_secs();
        let playing = session.is_playing();
        let transcript = session
            .editor()
            .transcript()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let diagnosis = session
            .editor()
            .diagnosis()
            .map(|d| d.text.clone())
            .unwrap_or_default();
        let status = self.status.clone();

        self.terminal.draw(|frame| {
            let area = frame.area();

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(8),  // waveform
                    Constraint::Length(1),  // clock / state
                    Constraint::Min(4),     // previews
                    Constraint::Length(1),  // status
                    Constraint::Length(1),  // help
                ])
                .split(area);

            let sparkline = Sparkline::default()
                .data(&waveform)
                .max(100)
                .style(
                    Style::default()
                        .bg(Color::Rgb(0, 0, 0))
                        .fg(Color::Rgb(206, 224, 220)),
                );
            frame.render_widget(sparkline, chunks[0]);

            let indicator = match state {
                SessionState::Recording => {
                    Span::styled("● ", Style::default().fg(Color::Red))
                }
                SessionState::Stopped if playing => {
                    Span::styled("▶ ", Style::default().fg(Color::Green))
                }
                SessionState::Stopped => Span::styled("■ ", Style::default().fg(Color::Yellow)),
                SessionState::Idle => Span::raw("  "),
            };
            let clock = Span::raw(format_elapsed(elapsed));
            let state_label = Span::raw(match state {
                SessionState::Idle => "  idle",
                SessionState::Recording => "  recording",
                SessionState::Stopped => "  stopped",
            });
            let clock_line = Line::from(vec![indicator, clock, state_label]);
            frame.render_widget(Paragraph::new(clock_line), chunks[1]);

            let preview_halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[2]);

            let transcript_preview = preview_paragraph("Transkripsiya", &transcript);
            frame.render_widget(transcript_preview, preview_halves[0]);

            let diagnosis_preview = preview_paragraph("Diagnoz", &diagnosis);
            frame.render_widget(diagnosis_preview, preview_halves[1]);

            if let Some((message, is_error)) = &status {
                let style = if *is_error {
                    Style::default().fg(Color::Rgb(255, 120, 120))
                } else {
                    Style::default().fg(Color::Rgb(185, 207, 212))
                };
                frame.render_widget(
                    Paragraph::new(Span::styled(message.clone(), style)),
                    chunks[3],
                );
            }

            let help = Paragraph::new(
                "space record/stop  enter transcribe  g generate  p play  e export  n reset  q quit",
            )
            .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(help, chunks[4]);
        })?;

        Ok(())
    }

    /// Renders a busy frame with a spinner while an external call runs.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render_busy(&mut self, message: &str) -> anyhow::Result<()> {
        self.spinner_tick = self.spinner_tick.wrapping_add(1);
        let spinner = SPINNER_FRAMES[self.spinner_tick % SPINNER_FRAMES.len()];
        let text = format!("{spinner} {message}");

        self.terminal.draw(|frame| {
            let area = frame.area();
            let centered = Rect {
                x: area.x,
                y: area.y + area.height / 2,
                width: area.width,
                height: 1,
            };
            let paragraph = Paragraph::new(text.clone()).alignment(Alignment::Center);
            frame.render_widget(paragraph, centered);
        })?;

        Ok(())
    }

    /// Polls for user input (50ms) and maps it to a pipeline command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<UiCommand> {
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Char(' ') => UiCommand::ToggleRecord,
                    KeyCode::Enter => UiCommand::Transcribe,
                    KeyCode::Char('g') => UiCommand::Generate,
                    KeyCode::Char('p') => UiCommand::TogglePlay,
                    KeyCode::Char('n') => UiCommand::Reset,
                    KeyCode::Char('e') => UiCommand::Export,
                    KeyCode::Char('q') | KeyCode::Esc => UiCommand::Quit,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        UiCommand::Quit
                    }
                    _ => UiCommand::Continue,
                });
            }
        }
        Ok(UiCommand::Continue)
    }

    /// Restores the terminal and leaves alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn preview_paragraph<'a>(title: &'a str, body: &'a str) -> Paragraph<'a> {
    let mut lines = vec![Line::from(Span::styled(
        title,
        Style::default().fg(Color::Rgb(185, 207, 212)),
    ))];
    if body.is_empty() {
        lines.push(Line::from(Span::styled(
            "—",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for line in body.lines().take(12) {
            lines.push(Line::from(Span::raw(line)));
        }
    }
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn format_elapsed(elapsed_secs: u64) -> String {
    format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::format_elapsed;

    #[test]
    fn elapsed_clock_is_zero_padded() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(600), "10:00");
    }
}
