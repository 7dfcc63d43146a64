//! Interactive attendance viewer.
//!
//! [`App`] owns the theme, the current view and the finished report, and
//! drives a blocking crossterm event loop until the user quits.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame, Terminal,
};

use attendance_core::models::AttendanceReport;

use crate::chart::AttendanceChart;
use crate::components::header::{chart_title, Header};
use crate::table_view::{self, table_data};
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Timeline chart.
    Chart,
    /// Per-student summary table.
    Table,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Chart => ViewMode::Table,
            ViewMode::Table => ViewMode::Chart,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the attendance TUI.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub twelve_hour: bool,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    pub report: AttendanceReport,
}

impl App {
    pub fn new(theme_name: &str, report: AttendanceReport, twelve_hour: bool) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view_mode: ViewMode::Chart,
            twelve_hour,
            should_quit: false,
            report,
        }
    }

    /// Run the TUI until `q`, `Q`, `Esc` or `Ctrl+C`.
    ///
    /// Polls for input with a 250 ms timeout so resizes are picked up
    /// between key presses.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('t') => self.view_mode = self.view_mode.toggle(),
            KeyCode::Char('c') => self.view_mode = ViewMode::Chart,
            _ => {}
        }
    }

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let [header_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let header = Header::new(&self.report, self.twelve_hour, &self.theme);
        frame.render_widget(Paragraph::new(Text::from(header.to_lines())), header_area);

        if self.report.students.is_empty() {
            table_view::render_no_data(frame, body_area, &self.theme);
        } else {
            match self.view_mode {
                ViewMode::Chart => {
                    let chart = AttendanceChart::new(&self.report, &self.theme, self.twelve_hour);
                    frame.render_widget(&chart, body_area);
                }
                ViewMode::Table => {
                    let (rows, totals) = table_data(&self.report, self.twelve_hour);
                    table_view::render_table_view(
                        frame,
                        body_area,
                        &chart_title(&self.report),
                        &rows,
                        &totals,
                        &self.theme,
                    );
                }
            }
        }

        let footer = Line::from(vec![
            Span::styled("Tab", self.theme.bold),
            Span::styled(" switch view  ", self.theme.dim),
            Span::styled("q", self.theme.bold),
            Span::styled(" quit", self.theme.dim),
        ]);
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
