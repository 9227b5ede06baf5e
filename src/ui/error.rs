//! Full-screen display for fatal, human-readable error messages.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::Paragraph};
use std::io::{self, Stdout};

/// Red full-screen error display, dismissed by any key press.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Creates the error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized or raw mode enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Displays the message centered on a red background and waits for a key.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();

                let background = Paragraph::new("")
                    .style(Style::default().bg(Color::Rgb(200, 0, 0)));
                frame.render_widget(background, area);

                let text_area = Rect {
                    x: area.x + area.width / 10,
                    y: area.y + area.height / 2,
                    width: (area.width * 8) / 10,
                    height: area.height.saturating_sub(area.height / 2),
                };

                let paragraph = Paragraph::new(error_message)
                    .style(
                        Style::default()
                            .fg(Color::Rgb(255, 255, 255))
                            .bg(Color::Rgb(200, 0, 0)),
                    )
                    .alignment(Alignment::Center)
                    .wrap(ratatui::widgets::Wrap { trim: true });

                frame.render_widget(paragraph, text_area);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Restores the terminal and leaves alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
