use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};
use crate::time_utils::minutes_between;

// ── Roster ────────────────────────────────────────────────────────────────────

/// One row of the course roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Given name as listed on the roster.
    pub first_name: String,
    /// Family name as listed on the roster.
    pub last_name: String,
    /// Alternate display name the student uses in meetings, if any.
    #[serde(default)]
    pub alias: Option<String>,
}

impl RosterEntry {
    pub fn new(first_name: &str, last_name: &str, alias: Option<&str>) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            alias: alias
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }

    /// Canonical identity: `"{first} {last}"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The canonical list of students for one course.
///
/// Entries are unique on [`RosterEntry::full_name`]; use [`Roster::push`] to
/// keep that invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entry` unless a student with the same full name already exists.
    ///
    /// Returns `false` when the entry was a duplicate and has been dropped.
    pub fn push(&mut self, entry: RosterEntry) -> bool {
        let name = entry.full_name();
        if self.entries.iter().any(|e| e.full_name() == name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All canonical names, sorted ascending.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(RosterEntry::full_name).collect();
        names.sort();
        names
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = RosterEntry>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for entry in iter {
            roster.push(entry);
        }
        roster
    }
}

// ── Raw log records ───────────────────────────────────────────────────────────

/// One join/leave row of a participants report, before name matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Display name as exported (parenthesised suffix already removed).
    pub raw_name: String,
    /// Email address, empty for guests.
    #[serde(default)]
    pub email: String,
    pub join: NaiveDateTime,
    pub leave: NaiveDateTime,
    /// Duration column as reported by the vendor, in minutes.
    #[serde(default)]
    pub reported_minutes: u32,
}

/// One message of a meeting chat log, before name matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender display name (parenthesised suffix already removed).
    pub raw_name: String,
    pub timestamp: NaiveDateTime,
    /// Direct message rather than a message to everyone.
    pub private: bool,
    /// Recipient for direct messages.
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub text: String,
}

// ── Matched records ───────────────────────────────────────────────────────────

/// A join/leave interval attributed to a roster student and clipped to the
/// session window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Canonical student name.
    pub student: String,
    pub join: NaiveDateTime,
    pub leave: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn minutes(&self) -> f64 {
        minutes_between(self.join, self.leave)
    }
}

/// A chat message attributed to a roster student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Canonical student name.
    pub student: String,
    pub timestamp: NaiveDateTime,
    pub private: bool,
}

// ── SessionWindow ─────────────────────────────────────────────────────────────

/// The valid attendance period for one class meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SessionWindow {
    /// Build a window on `date` from `start` to `end`.
    ///
    /// Fails when `end` is not strictly after `start`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if end <= start {
            return Err(AttendanceError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            date,
            start: date.and_time(start),
            end: date.and_time(end),
        })
    }

    /// `true` when `t` lies in `[start, end]`.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t <= self.end
    }

    /// Clip `[join, leave]` to the window.
    ///
    /// Returns `None` when the interval does not overlap the window or is
    /// reversed.  An interval touching the window only at a single instant
    /// is also dropped.
    pub fn clip(
        &self,
        join: NaiveDateTime,
        leave: NaiveDateTime,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let from = join.max(self.start);
        let to = leave.min(self.end);
        if from < to {
            Some((from, to))
        } else {
            None
        }
    }

    /// Class length in minutes.
    pub fn length_minutes(&self) -> f64 {
        minutes_between(self.start, self.end)
    }

    /// Window start plus the grace period.
    pub fn late_cutoff(&self, grace_minutes: u32) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(grace_minutes))
    }
}

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Tunable parameters of the attendance verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minutes after the start before a first join counts as late.
    pub grace_minutes: u32,
    /// Minimum fraction of the class a student must be present.
    pub min_duration: f64,
    /// Number of unanswered questions tolerated before marking absent.
    pub max_unanswered: u32,
    /// A burst of private chats must exceed this count to be a question.
    pub question_threshold: u32,
    /// Rolling window used to detect question bursts, in seconds.
    pub question_window_secs: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            grace_minutes: 2,
            min_duration: 0.9,
            max_unanswered: 1,
            question_threshold: 10,
            question_window_secs: 45,
        }
    }
}

// ── Analysis output ───────────────────────────────────────────────────────────

/// A burst of private chats interpreted as students answering a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Largest number of private chats seen within one rolling window.
    pub max_count: u32,
}

impl QuestionPeriod {
    pub fn midpoint(&self) -> NaiveDateTime {
        self.start + (self.end - self.start) / 2
    }
}

/// Per-student attendance verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    /// Display row; 0 is the alphabetically first student.
    pub id: usize,
    pub name: String,
    pub joined: bool,
    pub first_join: Option<NaiveDateTime>,
    /// Union of in-window intervals, in minutes.
    pub minutes_present: f64,
    /// `minutes_present` over the class length.
    pub frac_duration: f64,
    pub is_late: bool,
    /// Chat messages sent inside the window.
    pub chat_messages: u32,
    pub num_unanswered: u32,
    pub fraction_unanswered: f64,
    pub is_absent: bool,
}

/// Students who did not answer during one question period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnansweredQuestion {
    /// Index into [`AttendanceReport::question_periods`].
    pub period: usize,
    /// Canonical names, sorted.
    pub students: Vec<String>,
}

/// A log name that matched several roster students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousName {
    pub raw_name: String,
    pub candidates: Vec<String>,
}

/// Complete, deterministic result of analysing one meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub course: String,
    pub window: SessionWindow,
    pub late_cutoff: NaiveDateTime,
    pub thresholds: Thresholds,
    /// One summary per roster student, ordered by `id`.
    pub students: Vec<StudentSummary>,
    /// Matched, clipped join/leave intervals ordered by student then join.
    pub records: Vec<AttendanceRecord>,
    /// Matched in-window chat events ordered by time.
    pub chat: Vec<ChatEvent>,
    pub question_periods: Vec<QuestionPeriod>,
    pub unanswered: Vec<UnansweredQuestion>,
    /// Log names with no roster match, sorted and deduplicated.
    pub unknown_names: Vec<String>,
    pub ambiguous_names: Vec<AmbiguousName>,
}

impl AttendanceReport {
    pub fn absent_count(&self) -> usize {
        self.students.iter().filter(|s| s.is_absent).count()
    }

    pub fn present_count(&self) -> usize {
        self.students.len() - self.absent_count()
    }

    pub fn student(&self, name: &str) -> Option<&StudentSummary> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Records belonging to `name`.
    pub fn records_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttendanceRecord> {
        self.records.iter().filter(move |r| r.student == name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
