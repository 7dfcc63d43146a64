//! Main analysis pipeline.
//!
//! Loads the meeting inputs, matches log names to the roster, filters by
//! the session window, detects question periods and aggregates the result
//! into an [`AttendanceReport`] ready for the UI layer.

use std::collections::{BTreeMap, BTreeSet};

use attendance_core::error::Result;
use attendance_core::matcher::{MatchOutcome, NameMatcher};
use attendance_core::models::{
    AmbiguousName, AttendanceRecord, AttendanceReport, ChatEvent, ChatMessage, ParticipantRecord,
    Roster, SessionWindow, Thresholds, UnansweredQuestion,
};
use tracing::{debug, info, warn};

use crate::aggregator::AttendanceAggregator;
use crate::discovery::MeetingFiles;
use crate::questions::{find_question_periods, students_without_answer};
use crate::reader::{read_chat, read_participants, read_roster};

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full analysis pipeline for one meeting.
///
/// 1. Load the roster, participants report and (optional) chat log.
/// 2. Hand everything to [`analyze_inputs`].
pub fn analyze_meeting(
    files: &MeetingFiles,
    course: &str,
    window: &SessionWindow,
    thresholds: &Thresholds,
    allow_partial: bool,
) -> Result<AttendanceReport> {
    let load_start = std::time::Instant::now();

    let roster = read_roster(&files.roster)?;
    if roster.is_empty() {
        warn!("Roster {} has no students", files.roster.display());
    }
    let participants = read_participants(&files.participants)?;
    let chat = match &files.chat {
        Some(path) => read_chat(path, window.date)?,
        None => Vec::new(),
    };

    debug!(
        "Loaded {} students, {} participant rows, {} chat messages in {:.3}s",
        roster.len(),
        participants.len(),
        chat.len(),
        load_start.elapsed().as_secs_f64()
    );

    Ok(analyze_inputs(
        &roster,
        &participants,
        &chat,
        course,
        window,
        thresholds,
        allow_partial,
    ))
}

/// Analyse already-loaded inputs.
///
/// Deterministic: the same inputs always produce the same report.
pub fn analyze_inputs(
    roster: &Roster,
    participants: &[ParticipantRecord],
    chat: &[ChatMessage],
    course: &str,
    window: &SessionWindow,
    thresholds: &Thresholds,
    allow_partial: bool,
) -> AttendanceReport {
    // ── Step 1: Resolve names ─────────────────────────────────────────────────
    let matcher = NameMatcher::new(roster, allow_partial);
    let mut resolver = NameResolver::new(&matcher);

    // ── Step 2: Clip join/leave records ───────────────────────────────────────
    let mut records = Vec::new();
    let mut outside = 0usize;
    for p in participants {
        let Some(student) = resolver.resolve(&p.raw_name) else {
            continue;
        };
        match window.clip(p.join, p.leave) {
            Some((join, leave)) => records.push(AttendanceRecord {
                student,
                join,
                leave,
            }),
            None => outside += 1,
        }
    }
    records.sort_by(|a, b| {
        a.student
            .cmp(&b.student)
            .then(a.join.cmp(&b.join))
            .then(a.leave.cmp(&b.leave))
    });
    debug!(
        "{} in-window records, {} outside the window",
        records.len(),
        outside
    );

    // ── Step 3: Filter chat ───────────────────────────────────────────────────
    let mut in_window: Vec<&ChatMessage> =
        chat.iter().filter(|m| window.contains(m.timestamp)).collect();
    in_window.sort_by_key(|m| m.timestamp);

    let private_times: Vec<_> = in_window
        .iter()
        .filter(|m| m.private)
        .map(|m| m.timestamp)
        .collect();

    let chat_events: Vec<ChatEvent> = in_window
        .iter()
        .filter_map(|m| {
            resolver.resolve(&m.raw_name).map(|student| ChatEvent {
                student,
                timestamp: m.timestamp,
                private: m.private,
            })
        })
        .collect();

    // ── Step 4: Question periods ──────────────────────────────────────────────
    let question_periods = find_question_periods(
        &private_times,
        thresholds.question_threshold,
        thresholds.question_window_secs,
    );

    let present: BTreeSet<String> = records.iter().map(|r| r.student.clone()).collect();
    let unanswered: Vec<UnansweredQuestion> = question_periods
        .iter()
        .enumerate()
        .map(|(period, q)| UnansweredQuestion {
            period,
            students: students_without_answer(q, &present, &chat_events),
        })
        .collect();

    // ── Step 5: Aggregate ─────────────────────────────────────────────────────
    let stats = AttendanceAggregator::collect(
        &roster.sorted_names(),
        &records,
        &chat_events,
        &unanswered,
    );
    let students =
        AttendanceAggregator::summarize(&stats, window, thresholds, question_periods.len());

    let (unknown_names, ambiguous_names) = resolver.into_problems();
    for name in &unknown_names {
        warn!("Unknown name in meeting logs: {}", name);
    }
    for a in &ambiguous_names {
        warn!(
            "Ambiguous name {} could be any of {:?}",
            a.raw_name, a.candidates
        );
    }

    let report = AttendanceReport {
        course: course.to_string(),
        window: *window,
        late_cutoff: window.late_cutoff(thresholds.grace_minutes),
        thresholds: thresholds.clone(),
        students,
        records,
        chat: chat_events,
        question_periods,
        unanswered,
        unknown_names,
        ambiguous_names,
    };

    info!(
        "{} {}: {} present, {} absent, {} question periods",
        report.course,
        report.window.date,
        report.present_count(),
        report.absent_count(),
        report.question_periods.len()
    );
    report
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Memoising wrapper around [`NameMatcher`] that remembers every name it
/// could not resolve.
struct NameResolver<'a> {
    matcher: &'a NameMatcher,
    cache: BTreeMap<String, MatchOutcome>,
}

impl<'a> NameResolver<'a> {
    fn new(matcher: &'a NameMatcher) -> Self {
        Self {
            matcher,
            cache: BTreeMap::new(),
        }
    }

    fn resolve(&mut self, raw: &str) -> Option<String> {
        let matcher = self.matcher;
        let outcome = self
            .cache
            .entry(raw.to_string())
            .or_insert_with(|| matcher.resolve(raw));
        outcome.student().map(str::to_string)
    }

    /// Unknown names and ambiguous names, both sorted by raw name.
    fn into_problems(self) -> (Vec<String>, Vec<AmbiguousName>) {
        let mut unknown = Vec::new();
        let mut ambiguous = Vec::new();
        for (raw_name, outcome) in self.cache {
            match outcome {
                MatchOutcome::Unmatched => unknown.push(raw_name),
                MatchOutcome::Ambiguous(candidates) => ambiguous.push(AmbiguousName {
                    raw_name,
                    candidates,
                }),
                MatchOutcome::Matched { student, kind } => {
                    debug!("Resolved {:?} to {} ({})", raw_name, student, kind);
                }
            }
        }
        (unknown, ambiguous)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::locate_meeting_files;
    use attendance_core::models::RosterEntry;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, 9).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, s).unwrap()
    }

    fn window() -> SessionWindow {
        SessionWindow::new(
            date(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 40, 0).unwrap(),
        )
        .unwrap()
    }

    fn write_lines(path: &std::path::Path, lines: &[String]) {
        let mut file = fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn meeting_layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_lines(
            &root.join("OS roster.csv"),
            &[
                "First name,Last name,alias".to_string(),
                "Ann,Lee,".to_string(),
                "Bo,Li,Bobby".to_string(),
                "Cy,Ng,".to_string(),
            ],
        );

        let meeting = root.join("2021-02-09 13.58.20 OS");
        fs::create_dir(&meeting).unwrap();
        write_lines(
            &meeting.join("participants_9876.csv"),
            &[
                "Name (Original Name),User Email,Join Time,Leave Time,Duration (Minutes),Guest"
                    .to_string(),
                "Ann Lee (she/her),ann@x.edu,02/09/2021 01:55:00 PM,02/09/2021 03:45:00 PM,110,No"
                    .to_string(),
                "Bobby,,02/09/2021 02:00:30 PM,02/09/2021 03:40:00 PM,100,Yes".to_string(),
                "Cy Ng,cy@x.edu,02/09/2021 02:10:00 PM,02/09/2021 03:40:00 PM,90,No".to_string(),
                "Mystery Guest,,02/09/2021 02:00:00 PM,02/09/2021 03:40:00 PM,100,Yes".to_string(),
                "Ann Lee,ann@x.edu,02/09/2021 04:00:00 PM,02/09/2021 04:30:00 PM,30,No".to_string(),
            ],
        );

        let mut chat: Vec<String> = (0..12)
            .map(|i| {
                let who = if i % 2 == 0 { "Ann Lee" } else { "Mystery Guest" };
                format!(
                    "14:30:{:02}\t From  {}  to  Glenn Bruns(Direct Message) : A",
                    i * 2,
                    who
                )
            })
            .collect();
        chat.push("14:50:00\t From  Bobby : thanks".to_string());
        chat.push("16:00:00\t From  Cy Ng : bye".to_string());
        write_lines(&meeting.join("chat.txt"), &chat);
        dir
    }

    // ── analyze_meeting ───────────────────────────────────────────────────────

    #[test]
    fn test_analyze_meeting_end_to_end() {
        let dir = meeting_layout();
        let files = locate_meeting_files(dir.path(), "OS", "2021-02-09").unwrap();
        let report =
            analyze_meeting(&files, "OS", &window(), &Thresholds::default(), true).unwrap();

        assert_eq!(report.course, "OS");
        assert_eq!(report.late_cutoff, at(14, 2, 0));
        assert_eq!(report.students.len(), 3);
        assert_eq!(report.unknown_names, vec!["Mystery Guest"]);
        assert!(report.ambiguous_names.is_empty());

        // The 4 PM session lies outside the window.
        assert_eq!(report.records_for("Ann Lee").count(), 1);
        let ann = report.student("Ann Lee").unwrap();
        assert_eq!(ann.first_join, Some(at(14, 0, 0)));
        assert!(!ann.is_absent);
        assert_eq!(ann.chat_messages, 6);

        let bo = report.student("Bo Li").unwrap();
        assert!(!bo.is_late);
        assert_eq!(bo.chat_messages, 1);
        assert_eq!(bo.num_unanswered, 1);
        assert!(!bo.is_absent);

        let cy = report.student("Cy Ng").unwrap();
        assert!(cy.is_late);
        assert!(cy.is_absent);
        assert_eq!(cy.chat_messages, 0);

        assert_eq!(report.question_periods.len(), 1);
        assert_eq!(report.question_periods[0].start, at(14, 30, 0));
        assert_eq!(report.question_periods[0].end, at(14, 30, 22));
        assert_eq!(report.unanswered[0].students, vec!["Bo Li", "Cy Ng"]);

        assert!(report.chat.iter().all(|c| report.window.contains(c.timestamp)));
        assert_eq!(report.present_count(), 2);
        assert_eq!(report.absent_count(), 1);
    }

    #[test]
    fn test_analyze_meeting_without_chat() {
        let dir = meeting_layout();
        let mut files = locate_meeting_files(dir.path(), "OS", "2021-02-09").unwrap();
        files.chat = None;
        let report =
            analyze_meeting(&files, "OS", &window(), &Thresholds::default(), true).unwrap();
        assert!(report.question_periods.is_empty());
        assert!(report.chat.is_empty());
        assert!(report.students.iter().all(|s| s.num_unanswered == 0));
    }

    // ── analyze_inputs ────────────────────────────────────────────────────────

    fn participant(name: &str, join: NaiveDateTime, leave: NaiveDateTime) -> ParticipantRecord {
        ParticipantRecord {
            raw_name: name.to_string(),
            email: String::new(),
            join,
            leave,
            reported_minutes: 0,
        }
    }

    fn roster(entries: &[(&str, &str)]) -> Roster {
        entries
            .iter()
            .map(|(first, last)| RosterEntry::new(first, last, None))
            .collect()
    }

    #[test]
    fn test_out_of_window_records_are_excluded() {
        let roster = roster(&[("Ann", "Lee")]);
        let participants = vec![
            participant("Ann Lee", at(12, 0, 0), at(13, 0, 0)),
            participant("Ann Lee", at(16, 0, 0), at(17, 0, 0)),
            participant("Ann Lee", at(15, 40, 0), at(16, 0, 0)),
        ];
        let report = analyze_inputs(
            &roster,
            &participants,
            &[],
            "OS",
            &window(),
            &Thresholds::default(),
            true,
        );
        assert!(report.records.is_empty());
        let ann = report.student("Ann Lee").unwrap();
        assert!(!ann.joined);
        assert!(ann.is_absent);
    }

    #[test]
    fn test_ambiguous_names_are_reported_not_matched() {
        let roster = roster(&[("Ann", "Lee"), ("Ann", "Lopez")]);
        let participants = vec![participant("Ann L.", at(14, 0, 0), at(15, 40, 0))];
        let report = analyze_inputs(
            &roster,
            &participants,
            &[],
            "OS",
            &window(),
            &Thresholds::default(),
            true,
        );
        assert!(report.records.is_empty());
        assert!(report.unknown_names.is_empty());
        assert_eq!(report.ambiguous_names.len(), 1);
        assert_eq!(report.ambiguous_names[0].raw_name, "Ann L.");
        assert_eq!(report.ambiguous_names[0].candidates, vec!["Ann Lee", "Ann Lopez"]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let roster = roster(&[("Ann", "Lee"), ("Bo", "Li")]);
        let mut participants = vec![
            participant("Bo Li", at(14, 0, 0), at(15, 0, 0)),
            participant("Ann Lee", at(14, 30, 0), at(15, 40, 0)),
            participant("Ann Lee", at(14, 0, 0), at(14, 40, 0)),
            participant("Zed", at(14, 0, 0), at(15, 40, 0)),
        ];
        let first = analyze_inputs(
            &roster,
            &participants,
            &[],
            "OS",
            &window(),
            &Thresholds::default(),
            true,
        );
        participants.reverse();
        let second = analyze_inputs(
            &roster,
            &participants,
            &[],
            "OS",
            &window(),
            &Thresholds::default(),
            true,
        );
        assert_eq!(first.students, second.students);
        assert_eq!(first.records, second.records);
        assert_eq!(first.unknown_names, second.unknown_names);
        assert!((first.student("Ann Lee").unwrap().minutes_present - 100.0).abs() < 1e-9);
    }
}
