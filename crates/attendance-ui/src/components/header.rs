use crate::themes::Theme;
use attendance_core::models::AttendanceReport;
use attendance_core::time_utils::format_clock;
use ratatui::text::{Line, Span};

/// Width of the `=` separator under the title.
pub const SEPARATOR_WIDTH: usize = 60;

/// Chart title, e.g. `"OS Attendance, 2/9"`.
pub fn chart_title(report: &AttendanceReport) -> String {
    use chrono::Datelike;
    format!(
        "{} Attendance, {}/{}",
        report.course,
        report.window.date.month(),
        report.window.date.day()
    )
}

/// Report header rendering four lines:
///
/// 1. Chart title.
/// 2. A 60-column `=` separator.
/// 3. `[ start - end | late after hh:mm | N present | M absent ]`.
/// 4. An empty line.
pub struct Header<'a> {
    pub report: &'a AttendanceReport,
    pub twelve_hour: bool,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(report: &'a AttendanceReport, twelve_hour: bool, theme: &'a Theme) -> Self {
        Self {
            report,
            twelve_hour,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let window = &self.report.window;
        let clock = |t| format_clock(t, self.twelve_hour);

        vec![
            Line::from(Span::styled(chart_title(self.report), self.theme.header)),
            Line::from(Span::styled(
                "=".repeat(SEPARATOR_WIDTH),
                self.theme.separator,
            )),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(
                    format!("{} - {}", clock(window.start), clock(window.end)),
                    self.theme.value,
                ),
                Span::styled(" | late after ", self.theme.label),
                Span::styled(clock(self.report.late_cutoff), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!("{} present", self.report.present_count()),
                    self.theme.success,
                ),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!("{} absent", self.report.absent_count()),
                    self.theme.error,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use attendance_core::models::{SessionWindow, StudentSummary, Thresholds};
    use chrono::{NaiveDate, NaiveTime};

    /// Minimal report with the given `(name, is_absent)` students.
    pub(crate) fn report_with(students: &[(&str, bool)]) -> AttendanceReport {
        let window = SessionWindow::new(
            NaiveDate::from_ymd_opt(2021, 2, 9).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 40, 0).unwrap(),
        )
        .unwrap();
        let thresholds = Thresholds::default();
        AttendanceReport {
            course: "OS".to_string(),
            late_cutoff: window.late_cutoff(thresholds.grace_minutes),
            window,
            thresholds,
            students: students
                .iter()
                .enumerate()
                .map(|(id, (name, absent))| StudentSummary {
                    id,
                    name: name.to_string(),
                    joined: !absent,
                    first_join: None,
                    minutes_present: 0.0,
                    frac_duration: 0.0,
                    is_late: false,
                    chat_messages: 0,
                    num_unanswered: 0,
                    fraction_unanswered: 0.0,
                    is_absent: *absent,
                })
                .collect(),
            records: vec![],
            chat: vec![],
            question_periods: vec![],
            unanswered: vec![],
            unknown_names: vec![],
            ambiguous_names: vec![],
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let report = report_with(&[]);
        assert_eq!(Header::new(&report, false, &theme).to_lines().len(), 4);
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(chart_title(&report_with(&[])), "OS Attendance, 2/9");
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let report = report_with(&[("Ann Lee", false), ("Bo Li", true), ("Cy Ng", true)]);
        let lines = Header::new(&report, false, &theme).to_lines();
        assert_eq!(
            text(&lines[2]),
            "[ 14:00 - 15:40 | late after 14:02 | 1 present | 2 absent ]"
        );

        let lines = Header::new(&report, true, &theme).to_lines();
        assert!(text(&lines[2]).starts_with("[ 2:00 PM - 3:40 PM | late after 2:02 PM"));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let report = report_with(&[]);
        let lines = Header::new(&report, false, &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), SEPARATOR_WIDTH);
        assert!(sep.chars().all(|c| c == '='));
        assert!(text(&lines[3]).is_empty());
    }
}
