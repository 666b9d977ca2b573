use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::countdown::{format_countdown, CountdownController, DisplayBuffer, DisplayState};
use crate::events::AppEvent;

/// One bordered panel showing "Ready" in green or the remaining time in
/// white, plus a status bar naming the tailed log.
pub struct TuiApp {
    controller: CountdownController<DisplayBuffer>,
    event_rx: Receiver<AppEvent>,
    log_label: String,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(
        controller: CountdownController<DisplayBuffer>,
        event_rx: Receiver<AppEvent>,
        log_label: String,
    ) -> Self {
        Self {
            controller,
            event_rx,
            log_label,
            should_quit: false,
        }
    }

    pub fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            // Drive the countdown from the app channel
            match self.event_rx.recv_timeout(Duration::from_millis(50)) {
                Ok(app_event) => {
                    if !self.controller.handle_event(app_event) {
                        self.should_quit = true;
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    self.should_quit = true;
                }
            }

            // Handle keyboard input
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                            KeyCode::Char('r') => self.controller.handle_reset(),
                            _ => {}
                        }
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(5),    // Countdown panel
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());

        self.render_countdown(f, chunks[0]);
        self.render_status(f, chunks[1]);
    }

    fn render_countdown(&self, f: &mut Frame, area: Rect) {
        let (label, style) = match self.controller.sink().state() {
            DisplayState::Ready => (
                "Ready".to_string(),
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
            DisplayState::Counting { minutes, seconds } => (
                format_countdown(minutes * 60 + seconds),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        };

        // Pad the label down into the vertical middle of the panel
        let vertical_pad = (area.height.saturating_sub(3) / 2) as usize;
        let mut lines = vec![Line::from(""); vertical_pad];
        lines.push(Line::from(Span::styled(label, style)));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Rgb(64, 55, 47)))
                    .title(" Undying Retribution ")
                    .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            )
            .alignment(Alignment::Center);

        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let status_text = vec![Line::from(vec![
            Span::styled("Tailing ", Style::default().fg(Color::Rgb(150, 150, 150))),
            Span::styled(
                self.log_label.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  |  ", Style::default().fg(Color::Rgb(150, 150, 150))),
            Span::styled(" q ", Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" quit, ", Style::default().fg(Color::Rgb(150, 150, 150))),
            Span::styled(" r ", Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)),
            Span::styled(" reset", Style::default().fg(Color::Rgb(150, 150, 150))),
        ])];

        let status = Paragraph::new(status_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Rgb(80, 80, 80))),
            )
            .alignment(Alignment::Center);

        f.render_widget(status, area);
    }
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>, io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), io::Error> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}
