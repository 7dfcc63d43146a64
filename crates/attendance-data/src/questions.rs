//! Detect question-answering periods from bursts of private chat.
//!
//! Students answer polled questions by direct-messaging the instructor, so
//! a dense run of private chats marks a question.  A period opens at a
//! private chat that is alone in its rolling window, grows while later chats
//! keep the window occupied, and is kept only if the busiest window inside
//! it held more than `threshold` chats.

use std::collections::{BTreeSet, VecDeque};

use attendance_core::models::{ChatEvent, QuestionPeriod};
use chrono::{Duration, NaiveDateTime};

/// Period under construction.
struct OpenPeriod {
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    max_count: u32,
}

impl OpenPeriod {
    fn close(self, threshold: u32, periods: &mut Vec<QuestionPeriod>) {
        if self.max_count > threshold {
            periods.push(QuestionPeriod {
                start: self.start,
                end: self.end.unwrap_or(self.start),
                max_count: self.max_count,
            });
        }
    }
}

/// Find question periods among the timestamps of private chats.
///
/// For every chat (in time order) the rolling count is the number of private
/// chats in `(t - window, t]` up to and including that chat.
pub fn find_question_periods(
    private_times: &[NaiveDateTime],
    threshold: u32,
    window_secs: u32,
) -> Vec<QuestionPeriod> {
    let mut times = private_times.to_vec();
    times.sort();
    let window = Duration::seconds(i64::from(window_secs));

    let mut in_window: VecDeque<NaiveDateTime> = VecDeque::new();
    let mut periods = Vec::new();
    let mut current: Option<OpenPeriod> = None;

    for t in times {
        in_window.push_back(t);
        while in_window.front().is_some_and(|&front| front <= t - window) {
            in_window.pop_front();
        }
        let count = in_window.len() as u32;

        if count == 1 {
            if let Some(open) = current.take() {
                open.close(threshold, &mut periods);
            }
            current = Some(OpenPeriod {
                start: t,
                end: None,
                max_count: 1,
            });
        } else if let Some(open) = current.as_mut() {
            open.end = Some(t);
            open.max_count = open.max_count.max(count);
        }
    }

    if let Some(open) = current {
        open.close(threshold, &mut periods);
    }

    periods
}

/// Students in `present` who sent no chat, public or private, during
/// `period`.  Sorted by name.
pub fn students_without_answer(
    period: &QuestionPeriod,
    present: &BTreeSet<String>,
    chat: &[ChatEvent],
) -> Vec<String> {
    let answered: BTreeSet<&str> = chat
        .iter()
        .filter(|c| c.timestamp >= period.start && c.timestamp <= period.end)
        .map(|c| c.student.as_str())
        .collect();

    present
        .iter()
        .filter(|name| !answered.contains(name.as_str()))
        .cloned()
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
