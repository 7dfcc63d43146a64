//! Per-student summary table for the interactive view.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per student
//! plus a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use attendance_core::formatting;
use attendance_core::models::{AttendanceReport, StudentSummary};
use attendance_core::time_utils::format_clock;

use crate::themes::Theme;

/// Column headers, in display order.
pub const HEADERS: [&str; 8] = [
    "Student",
    "Status",
    "Present",
    "Duration",
    "First join",
    "Late",
    "Chat",
    "Unanswered",
];

/// Display strings for one student row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowData {
    pub name: String,
    pub status: String,
    pub minutes: String,
    pub duration: String,
    pub first_join: String,
    pub late: String,
    pub chat: String,
    pub unanswered: String,
    pub is_absent: bool,
}

impl TableRowData {
    pub fn from_summary(s: &StudentSummary, num_questions: usize, twelve_hour: bool) -> Self {
        Self {
            name: s.name.clone(),
            status: if s.is_absent { "Absent" } else { "Present" }.to_string(),
            minutes: formatting::format_minutes(s.minutes_present),
            duration: formatting::format_fraction(s.frac_duration),
            first_join: s
                .first_join
                .map(|t| format_clock(t, twelve_hour))
                .unwrap_or_else(|| "-".to_string()),
            late: formatting::yes_no(s.is_late).to_string(),
            chat: s.chat_messages.to_string(),
            unanswered: format!("{}/{}", s.num_unanswered, num_questions),
            is_absent: s.is_absent,
        }
    }
}

/// Totals across all rows of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTotals {
    pub students: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub chat_messages: u32,
    pub questions: usize,
}

impl TableTotals {
    pub fn from_report(report: &AttendanceReport) -> Self {
        Self {
            students: report.students.len(),
            present: report.present_count(),
            absent: report.absent_count(),
            late: report.students.iter().filter(|s| s.is_late).count(),
            chat_messages: report.students.iter().map(|s| s.chat_messages).sum(),
            questions: report.question_periods.len(),
        }
    }
}

/// Build the rows and totals for `report`.
pub fn table_data(report: &AttendanceReport, twelve_hour: bool) -> (Vec<TableRowData>, TableTotals) {
    let questions = report.question_periods.len();
    let rows = report
        .students
        .iter()
        .map(|s| TableRowData::from_summary(s, questions, twelve_hour))
        .collect();
    (rows, TableTotals::from_report(report))
}

/// Render the summary table into `area`.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[TableRowData],
    totals: &TableTotals,
    theme: &Theme,
) {
    let header_cells = HEADERS
        .iter()
        .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(row.name.clone()),
                Cell::from(row.status.clone()).style(theme.verdict_style(row.is_absent)),
                Cell::from(row.minutes.clone()),
                Cell::from(row.duration.clone()),
                Cell::from(row.first_join.clone()),
                Cell::from(row.late.clone()),
                Cell::from(row.chat.clone()),
                Cell::from(row.unanswered.clone()),
            ])
            .style(style)
        })
        .collect();

    let total_row = Row::new(vec![
        Cell::from("TOTAL").style(theme.table_total),
        Cell::from(format!("{} absent", totals.absent)),
        Cell::from(format!("{} present", totals.present)),
        Cell::from(format!("{} students", totals.students)),
        Cell::from(""),
        Cell::from(totals.late.to_string()),
        Cell::from(totals.chat_messages.to_string()),
        Cell::from(format!("{} questions", totals.questions)),
    ])
    .style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let name_width = rows
        .iter()
        .map(|r| unicode_width::UnicodeWidthStr::width(r.name.as_str()))
        .max()
        .unwrap_or(0)
        .clamp(12, 32) as u16;
    let widths = [
        Constraint::Length(name_width),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(14),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when the roster is empty.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No students in the roster", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the course roster CSV in the Zoom directory.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Zoom Attendance "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
