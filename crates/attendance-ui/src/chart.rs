//! Attendance timeline chart.
//!
//! One row per student in display order, names on the left and the class
//! window laid out horizontally:
//!
//! ```text
//!                          OS Attendance, 2/9
//! ━ present  ━ late  │ start/end  ┆ late cutoff  ┊ question  ● unanswered  * absent
//!   Ann Lee  ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! * Bo Li    │ ┆  ━━━━━━━━━━━━━●━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//!            ────────────┴─────────┴─────────┴─────────┴─────────┴───
//!            14:00      14:10     14:20     14:30     14:40     14:50
//! ```
//!
//! Bars are drawn first; window, late-cutoff and question markers only fill
//! cells a bar left blank; unanswered-question dots go on top.

use attendance_core::models::{AttendanceReport, StudentSummary};
use attendance_core::time_utils::format_clock;
use chrono::{NaiveDateTime, Timelike};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::components::header::chart_title;
use crate::components::legend::{
    Legend, ABSENT_MARK, BAR, LATE_CUTOFF, QUESTION_EDGE, UNANSWERED, WINDOW_EDGE,
};
use crate::themes::Theme;

/// Title, legend, axis and axis labels.
pub const CHROME_ROWS: u16 = 4;

/// Candidate spacings between axis ticks, in minutes.
const TICK_STEPS: [u32; 6] = [5, 10, 15, 30, 60, 120];

// ── TimeScale ─────────────────────────────────────────────────────────────────

/// Maps instants inside the class window onto buffer columns.
#[derive(Debug, Clone, Copy)]
struct TimeScale {
    start: NaiveDateTime,
    span_ms: i64,
    x: u16,
    width: u16,
}

impl TimeScale {
    fn new(start: NaiveDateTime, end: NaiveDateTime, x: u16, width: u16) -> Self {
        Self {
            start,
            span_ms: (end - start).num_milliseconds().max(1),
            x,
            width,
        }
    }

    /// Column of `t`; instants outside the window snap to the edges.
    fn column(&self, t: NaiveDateTime) -> u16 {
        let offset = (t - self.start).num_milliseconds().clamp(0, self.span_ms);
        let frac = offset as f64 / self.span_ms as f64;
        self.x + (frac * f64::from(self.width.saturating_sub(1))).round() as u16
    }
}

/// Clock-aligned tick instants in `[start, end]`, at most `max_ticks` of
/// them, using the finest step from [`TICK_STEPS`] that fits.
pub fn axis_ticks(start: NaiveDateTime, end: NaiveDateTime, max_ticks: usize) -> Vec<NaiveDateTime> {
    let date = start.date();
    let first_minute = start.hour() * 60 + start.minute() + u32::from(start.second() > 0);
    let last_minute = end.hour() * 60 + end.minute();

    let ticks_for = |step: u32| -> Vec<NaiveDateTime> {
        let first = first_minute.div_ceil(step) * step;
        (first..=last_minute)
            .step_by(step as usize)
            .filter_map(|m| date.and_hms_opt(m / 60, m % 60, 0))
            .collect()
    };

    TICK_STEPS
        .iter()
        .map(|&step| ticks_for(step))
        .find(|ticks| ticks.len() <= max_ticks.max(1))
        .unwrap_or_default()
}

// ── AttendanceChart ───────────────────────────────────────────────────────────

/// Timeline chart of one meeting; render with `frame.render_widget(&chart, area)`
/// or straight into a [`Buffer`].
pub struct AttendanceChart<'a> {
    pub report: &'a AttendanceReport,
    pub theme: &'a Theme,
    pub twelve_hour: bool,
}

impl<'a> AttendanceChart<'a> {
    pub fn new(report: &'a AttendanceReport, theme: &'a Theme, twelve_hour: bool) -> Self {
        Self {
            report,
            theme,
            twelve_hour,
        }
    }

    /// Rows needed to show every student.
    pub fn required_height(&self) -> u16 {
        let rows = self
            .report
            .students
            .len()
            .min(usize::from(u16::MAX - CHROME_ROWS));
        rows as u16 + CHROME_ROWS
    }

    fn name_label(student: &StudentSummary) -> String {
        let mark = if student.is_absent { ABSENT_MARK } else { " " };
        format!("{} {}", mark, student.name)
    }

    /// Width of the name column: the widest label, capped at a third of
    /// the chart.
    fn name_column_width(&self, total_width: u16) -> u16 {
        let widest = self
            .report
            .students
            .iter()
            .map(|s| Self::name_label(s).width())
            .max()
            .unwrap_or(0);
        (widest.min(usize::from(total_width / 3))) as u16
    }

    fn render_student_row(
        &self,
        student: &StudentSummary,
        area: Rect,
        y: u16,
        name_width: u16,
        scale: &TimeScale,
        buf: &mut Buffer,
    ) {
        let theme = self.theme;
        buf.set_stringn(
            area.x,
            y,
            Self::name_label(student),
            usize::from(name_width),
            theme.verdict_style(student.is_absent),
        );

        let bar_style = theme.bar_style(student.is_late);
        for record in self.report.records_for(&student.name) {
            for x in scale.column(record.join)..=scale.column(record.leave) {
                put(buf, x, y, BAR, bar_style, true);
            }
        }

        let window = &self.report.window;
        put(buf, scale.column(window.start), y, WINDOW_EDGE, theme.chart_window, false);
        put(buf, scale.column(window.end), y, WINDOW_EDGE, theme.chart_window, false);
        put(
            buf,
            scale.column(self.report.late_cutoff),
            y,
            LATE_CUTOFF,
            theme.chart_late_cutoff,
            false,
        );
        for period in &self.report.question_periods {
            put(buf, scale.column(period.start), y, QUESTION_EDGE, theme.chart_question, false);
            put(buf, scale.column(period.end), y, QUESTION_EDGE, theme.chart_question, false);
        }

        for question in &self.report.unanswered {
            if !question.students.contains(&student.name) {
                continue;
            }
            if let Some(period) = self.report.question_periods.get(question.period) {
                put(
                    buf,
                    scale.column(period.midpoint()),
                    y,
                    UNANSWERED,
                    theme.chart_unanswered,
                    true,
                );
            }
        }
    }

    fn render_axis(&self, area: Rect, y: u16, scale: &TimeScale, buf: &mut Buffer) {
        let label_width = if self.twelve_hour { 8 } else { 5 };
        let max_ticks = usize::from(scale.width) / (label_width + 2);
        let window = &self.report.window;
        let ticks = axis_ticks(window.start, window.end, max_ticks);

        for x in scale.x..scale.x + scale.width {
            put(buf, x, y, "─", self.theme.dim, true);
        }
        for &t in &ticks {
            put(buf, scale.column(t), y, "┴", self.theme.dim, true);
        }

        if y + 1 >= area.bottom() {
            return;
        }
        let mut next_free = scale.x;
        for &t in &ticks {
            let label = format_clock(t, self.twelve_hour);
            let w = label.width() as u16;
            let centred = scale.column(t).saturating_sub(w / 2);
            let lx = centred.max(scale.x).min(area.right().saturating_sub(w));
            if lx < next_free {
                continue;
            }
            buf.set_string(lx, y + 1, &label, self.theme.label);
            next_free = lx + w + 1;
        }
    }
}

impl Widget for &AttendanceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < CHROME_ROWS || area.width < 8 {
            return;
        }

        Line::styled(chart_title(self.report), self.theme.header)
            .centered()
            .render(Rect { height: 1, ..area }, buf);
        buf.set_line(
            area.x,
            area.y + 1,
            &Legend::new(self.theme).to_line(),
            area.width,
        );

        let name_width = self.name_column_width(area.width);
        let plot_x = area.x + name_width + 1;
        let plot_width = area.right().saturating_sub(plot_x + 1);
        if plot_width < 2 {
            return;
        }
        let window = &self.report.window;
        let scale = TimeScale::new(window.start, window.end, plot_x, plot_width);

        let rows = usize::from(area.height - CHROME_ROWS);
        let mut y = area.y + 2;
        for student in self.report.students.iter().take(rows) {
            self.render_student_row(student, area, y, name_width, &scale, buf);
            y += 1;
        }

        self.render_axis(area, y, &scale, buf);
    }
}

/// Write `symbol` at `(x, y)`; unless `overwrite`, only into a blank cell.
fn put(buf: &mut Buffer, x: u16, y: u16, symbol: &str, style: Style, overwrite: bool) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        if overwrite || cell.symbol() == " " {
            cell.set_symbol(symbol).set_style(style);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use attendance_core::models::{
        ChatMessage, ParticipantRecord, Roster, RosterEntry, SessionWindow, Thresholds,
    };
    use attendance_data::analysis::analyze_inputs;
    use chrono::{Duration, NaiveDate, NaiveTime};

    use crate::export::buffer_to_string;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 2, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    /// Ann on time for the whole class and answering the one question; Bo
    /// late and silent.
    pub(crate) fn sample_report() -> AttendanceReport {
        let window = SessionWindow::new(
            NaiveDate::from_ymd_opt(2021, 2, 9).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 40, 0).unwrap(),
        )
        .unwrap();
        let roster: Roster = vec![
            RosterEntry::new("Bo", "Li", None),
            RosterEntry::new("Ann", "Lee", None),
        ]
        .into_iter()
        .collect();
        let participant = |name: &str, join, leave| ParticipantRecord {
            raw_name: name.to_string(),
            email: String::new(),
            join,
            leave,
            reported_minutes: 0,
        };
        let participants = vec![
            participant("Ann Lee", at(13, 58, 0), at(15, 41, 0)),
            participant("Bo Li", at(14, 5, 0), at(15, 40, 0)),
        ];
        let chat: Vec<ChatMessage> = (0..12)
            .map(|i| ChatMessage {
                raw_name: "Ann Lee".to_string(),
                timestamp: at(14, 30, 0) + Duration::seconds(2 * i),
                private: true,
                recipient: Some("Glenn Bruns".to_string()),
                text: "A".to_string(),
            })
            .collect();
        analyze_inputs(
            &roster,
            &participants,
            &chat,
            "OS",
            &window,
            &Thresholds::default(),
            true,
        )
    }

    fn render(report: &AttendanceReport, width: u16, height: u16) -> Vec<String> {
        let theme = Theme::dark();
        let chart = AttendanceChart::new(report, &theme, false);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        (&chart).render(area, &mut buf);
        buffer_to_string(&buf).lines().map(str::to_string).collect()
    }

    fn char_at(line: &str, col: usize) -> char {
        line.chars().nth(col).unwrap_or(' ')
    }

    // ── axis_ticks ────────────────────────────────────────────────────────────

    #[test]
    fn test_axis_ticks_picks_finest_step_that_fits() {
        let ticks = axis_ticks(at(14, 0, 0), at(15, 40, 0), 14);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0], at(14, 0, 0));
        assert_eq!(ticks[1], at(14, 10, 0));
        assert_eq!(*ticks.last().unwrap(), at(15, 40, 0));
    }

    #[test]
    fn test_axis_ticks_align_to_clock() {
        let ticks = axis_ticks(at(13, 58, 20), at(14, 40, 0), 20);
        assert_eq!(ticks[0], at(14, 0, 0));
        assert!(ticks.iter().all(|t| t.minute() % 5 == 0));
    }

    // ── AttendanceChart ───────────────────────────────────────────────────────

    #[test]
    fn test_required_height() {
        let report = sample_report();
        let theme = Theme::dark();
        let chart = AttendanceChart::new(&report, &theme, false);
        assert_eq!(chart.required_height(), 2 + CHROME_ROWS);
    }

    #[test]
    fn test_render_chart_rows() {
        let report = sample_report();
        // Name column 9 wide, one gap, 101 plot columns: one column per minute.
        let lines = render(&report, 112, 6);
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("OS Attendance, 2/9"));
        assert!(lines[1].contains("unanswered"));

        assert_eq!(lines[2], format!("  Ann Lee {}", BAR.repeat(101)));

        let bo = &lines[3];
        assert!(bo.starts_with("* Bo Li"));
        assert_eq!(char_at(bo, 10), '│');
        assert_eq!(char_at(bo, 11), ' ');
        assert_eq!(char_at(bo, 12), '┆');
        assert_eq!(char_at(bo, 15), '━');
        // Question 14:30:00-14:30:22, midpoint column 40.
        assert_eq!(char_at(bo, 40), '●');
        assert_eq!(char_at(bo, 110), '━');
    }

    #[test]
    fn test_render_chart_axis() {
        let report = sample_report();
        let lines = render(&report, 112, 6);
        assert_eq!(char_at(&lines[4], 10), '┴');
        assert_eq!(char_at(&lines[4], 15), '─');
        assert_eq!(char_at(&lines[4], 20), '┴');
        assert!(lines[5].contains("14:00"));
        assert!(lines[5].contains("14:10"));
        assert!(lines[5].contains("15:40"));
    }

    #[test]
    fn test_render_chart_truncates_rows_to_area() {
        let report = sample_report();
        let lines = render(&report, 112, 5);
        assert!(lines[2].starts_with("  Ann Lee"));
        assert!(lines[3].contains('┴'));
        assert!(!lines.iter().any(|l| l.contains("Bo Li")));
    }

    #[test]
    fn test_render_chart_tiny_area_does_not_panic() {
        let report = sample_report();
        for (w, h) in [(1, 1), (7, 10), (12, 4), (20, 3)] {
            render(&report, w, h);
        }
    }
}
