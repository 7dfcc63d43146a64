//! Per-student attendance aggregation.
//!
//! Folds matched, window-clipped join/leave records, chat events and
//! unanswered questions into one [`StudentSummary`] per roster student.

use std::collections::BTreeMap;

use attendance_core::models::{
    AttendanceRecord, ChatEvent, SessionWindow, StudentSummary, Thresholds, UnansweredQuestion,
};
use attendance_core::time_utils::minutes_between;
use chrono::NaiveDateTime;

// ── PresenceStats ─────────────────────────────────────────────────────────────

/// Everything observed about one student during the window.
#[derive(Debug, Clone, Default)]
pub struct PresenceStats {
    /// Clipped `(join, leave)` intervals, in insertion order.
    pub intervals: Vec<(NaiveDateTime, NaiveDateTime)>,
    pub chat_messages: u32,
    pub num_unanswered: u32,
}

impl PresenceStats {
    pub fn add_record(&mut self, record: &AttendanceRecord) {
        self.intervals.push((record.join, record.leave));
    }

    pub fn add_chat(&mut self, _event: &ChatEvent) {
        self.chat_messages += 1;
    }

    /// Earliest join, if the student joined at all.
    pub fn first_join(&self) -> Option<NaiveDateTime> {
        self.intervals.iter().map(|(join, _)| *join).min()
    }

    /// Length of the union of all intervals, in minutes.
    ///
    /// Overlapping sessions (e.g. laptop and phone) count once.
    pub fn minutes_present(&self) -> f64 {
        merge_intervals(&self.intervals)
            .iter()
            .map(|(from, to)| minutes_between(*from, *to))
            .fold(0.0, |acc, m| acc + m)
    }
}

/// Merge overlapping or touching intervals; output is sorted by start.
pub fn merge_intervals(
    intervals: &[(NaiveDateTime, NaiveDateTime)],
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut sorted = intervals.to_vec();
    sorted.sort();

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::with_capacity(sorted.len());
    for (from, to) in sorted {
        match merged.last_mut() {
            Some(last) if from <= last.1 => {
                if to > last.1 {
                    last.1 = to;
                }
            }
            _ => merged.push((from, to)),
        }
    }
    merged
}

// ── AttendanceAggregator ──────────────────────────────────────────────────────

/// Stateless helper that turns per-student observations into verdicts.
pub struct AttendanceAggregator;

impl AttendanceAggregator {
    /// Group records, chat events and unanswered questions by student.
    ///
    /// Every name in `students` gets an entry, even with no observations;
    /// observations for names outside `students` are ignored.
    pub fn collect(
        students: &[String],
        records: &[AttendanceRecord],
        chat: &[ChatEvent],
        unanswered: &[UnansweredQuestion],
    ) -> BTreeMap<String, PresenceStats> {
        let mut map: BTreeMap<String, PresenceStats> = students
            .iter()
            .map(|name| (name.clone(), PresenceStats::default()))
            .collect();

        for record in records {
            if let Some(stats) = map.get_mut(&record.student) {
                stats.add_record(record);
            }
        }
        for event in chat {
            if let Some(stats) = map.get_mut(&event.student) {
                stats.add_chat(event);
            }
        }
        for question in unanswered {
            for name in &question.students {
                if let Some(stats) = map.get_mut(name) {
                    stats.num_unanswered += 1;
                }
            }
        }

        map
    }

    /// Build the summary rows, ordered alphabetically with `id` 0 first.
    pub fn summarize(
        stats: &BTreeMap<String, PresenceStats>,
        window: &SessionWindow,
        thresholds: &Thresholds,
        num_questions: usize,
    ) -> Vec<StudentSummary> {
        let class_minutes = window.length_minutes();
        let late_cutoff = window.late_cutoff(thresholds.grace_minutes);

        stats
            .iter()
            .enumerate()
            .map(|(id, (name, s))| {
                let first_join = s.first_join();
                let joined = first_join.is_some();
                let minutes_present = s.minutes_present();
                let frac_duration = if class_minutes > 0.0 {
                    minutes_present / class_minutes
                } else {
                    0.0
                };
                let is_late = first_join.map(|t| t > late_cutoff).unwrap_or(false);
                let fraction_unanswered = if num_questions > 0 {
                    f64::from(s.num_unanswered) / num_questions as f64
                } else {
                    0.0
                };
                let is_absent = is_late
                    || !joined
                    || s.num_unanswered > thresholds.max_unanswered
                    || frac_duration < thresholds.min_duration;

                StudentSummary {
                    id,
                    name: name.clone(),
                    joined,
                    first_join,
                    minutes_present,
                    frac_duration,
                    is_late,
                    chat_messages: s.chat_messages,
                    num_unanswered: s.num_unanswered,
                    fraction_unanswered,
                    is_absent,
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
