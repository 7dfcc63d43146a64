use crate::themes::Theme;
use ratatui::text::{Line, Span};

// ── Chart glyphs ──────────────────────────────────────────────────────────────

pub const BAR: &str = "━";
pub const WINDOW_EDGE: &str = "│";
pub const LATE_CUTOFF: &str = "┆";
pub const QUESTION_EDGE: &str = "┊";
pub const UNANSWERED: &str = "●";
pub const ABSENT_MARK: &str = "*";

/// One-line key explaining the chart glyphs.
pub struct Legend<'a> {
    pub theme: &'a Theme,
}

impl<'a> Legend<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    pub fn to_line(&self) -> Line<'a> {
        let t = self.theme;
        Line::from(vec![
            Span::styled(BAR, t.chart_bar),
            Span::styled(" present  ", t.dim),
            Span::styled(BAR, t.chart_bar_late),
            Span::styled(" late  ", t.dim),
            Span::styled(WINDOW_EDGE, t.chart_window),
            Span::styled(" start/end  ", t.dim),
            Span::styled(LATE_CUTOFF, t.chart_late_cutoff),
            Span::styled(" late cutoff  ", t.dim),
            Span::styled(QUESTION_EDGE, t.chart_question),
            Span::styled(" question  ", t.dim),
            Span::styled(UNANSWERED, t.chart_unanswered),
            Span::styled(" unanswered  ", t.dim),
            Span::styled(ABSENT_MARK, t.error),
            Span::styled(" absent", t.dim),
        ])
    }
}
