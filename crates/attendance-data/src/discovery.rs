//! Locate the roster and meeting exports inside a Zoom directory.
//!
//! Layout convention:
//!
//! ```text
//! <zoom_dir>/
//!     <course>*.csv                        roster
//!     *<date>*<course>*/                   one directory per meeting
//!         participants*.csv                join/leave report
//!         chat.txt                         chat log (optional)
//! ```

use std::path::{Path, PathBuf};

use attendance_core::error::{AttendanceError, Result};
use tracing::{debug, warn};

/// Paths of every input needed to analyse one meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingFiles {
    pub meeting_dir: PathBuf,
    pub roster: PathBuf,
    pub participants: PathBuf,
    /// `None` when the meeting has no chat log.
    pub chat: Option<PathBuf>,
}

/// Find the meeting directory, roster, participants report and chat log
/// for `course` on `date`.
///
/// Every input except the chat log must match exactly once.
pub fn locate_meeting_files(zoom_dir: &Path, course: &str, date: &str) -> Result<MeetingFiles> {
    let meeting_dir = find_meeting_dir(zoom_dir, course, date)?;
    let roster = find_roster_file(zoom_dir, course)?;
    let participants = find_participants_file(&meeting_dir)?;
    let chat = find_chat_file(&meeting_dir)?;

    debug!(
        "Meeting files: dir={}, roster={}, participants={}, chat={:?}",
        meeting_dir.display(),
        roster.display(),
        participants.display(),
        chat
    );

    Ok(MeetingFiles {
        meeting_dir,
        roster,
        participants,
        chat,
    })
}

/// The single directory whose name contains `date` followed by `course`.
pub fn find_meeting_dir(zoom_dir: &Path, course: &str, date: &str) -> Result<PathBuf> {
    let matches: Vec<PathBuf> = list_entries(zoom_dir)?
        .into_iter()
        .filter(|(path, name)| path.is_dir() && date_then_course(name, date, course))
        .map(|(path, _)| path)
        .collect();

    match <[PathBuf; 1]>::try_from(matches) {
        Ok([dir]) => Ok(dir),
        Err(found) => Err(AttendanceError::MeetingNotFound {
            course: course.to_string(),
            date: date.to_string(),
            dir: zoom_dir.to_path_buf(),
            found: found.len(),
        }),
    }
}

/// The single `<course>*.csv` file in `zoom_dir`.
pub fn find_roster_file(zoom_dir: &Path, course: &str) -> Result<PathBuf> {
    let matches: Vec<PathBuf> = list_entries(zoom_dir)?
        .into_iter()
        .filter(|(path, name)| path.is_file() && name.starts_with(course) && name.ends_with(".csv"))
        .map(|(path, _)| path)
        .collect();

    match <[PathBuf; 1]>::try_from(matches) {
        Ok([file]) => Ok(file),
        Err(found) => Err(AttendanceError::RosterNotFound {
            course: course.to_string(),
            dir: zoom_dir.to_path_buf(),
            found: found.len(),
        }),
    }
}

/// The single `participants*.csv` file in `meeting_dir`.
pub fn find_participants_file(meeting_dir: &Path) -> Result<PathBuf> {
    let matches: Vec<PathBuf> = list_entries(meeting_dir)?
        .into_iter()
        .filter(|(path, name)| {
            path.is_file() && name.starts_with("participants") && name.ends_with(".csv")
        })
        .map(|(path, _)| path)
        .collect();

    match <[PathBuf; 1]>::try_from(matches) {
        Ok([file]) => Ok(file),
        Err(found) => Err(AttendanceError::ParticipantsNotFound {
            dir: meeting_dir.to_path_buf(),
            found: found.len(),
        }),
    }
}

/// The chat log of a meeting: `chat.txt`, or else a single `*chat.txt`
/// such as `meeting_saved_chat.txt`.
///
/// Returns `Ok(None)` with a warning when there is no unambiguous chat log.
pub fn find_chat_file(meeting_dir: &Path) -> Result<Option<PathBuf>> {
    let exact = meeting_dir.join("chat.txt");
    if exact.is_file() {
        return Ok(Some(exact));
    }

    let matches: Vec<PathBuf> = list_entries(meeting_dir)?
        .into_iter()
        .filter(|(path, name)| path.is_file() && name.ends_with("chat.txt"))
        .map(|(path, _)| path)
        .collect();

    match <[PathBuf; 1]>::try_from(matches) {
        Ok([file]) => Ok(Some(file)),
        Err(found) => {
            warn!(
                "No single chat file in {} (found {}); continuing without chat",
                meeting_dir.display(),
                found.len()
            );
            Ok(None)
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Direct children of `dir` as `(path, file name)`, sorted by name.
fn list_entries(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    if !dir.is_dir() {
        return Err(AttendanceError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            (entry.into_path(), name)
        })
        .collect();

    Ok(entries)
}

/// Shell-glob `*<date>*<course>*` test.
fn date_then_course(name: &str, date: &str, course: &str) -> bool {
    match name.find(date) {
        Some(idx) => name[idx + date.len()..].contains(course),
        None => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, "").unwrap();
    }

    fn zoom_layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("OS roster.csv"));
        touch(&root.join("Logic.csv"));
        let meeting = root.join("2021-02-09 10.00.12 OS lecture");
        fs::create_dir(&meeting).unwrap();
        touch(&meeting.join("participants_912345.csv"));
        touch(&meeting.join("chat.txt"));
        fs::create_dir(root.join("2021-02-11 10.01.00 OS lecture")).unwrap();
        fs::create_dir(root.join("2021-02-09 13.58.20 Logic")).unwrap();
        dir
    }

    #[test]
    fn test_date_then_course() {
        assert!(date_then_course("2021-02-09 13.58 Data Science", "2021-02-09", "Data Science"));
        assert!(!date_then_course("Data Science 2021-02-09", "2021-02-09", "Data Science"));
        assert!(!date_then_course("2021-02-10 OS", "2021-02-09", "OS"));
    }

    #[test]
    fn test_locate_meeting_files() {
        let dir = zoom_layout();
        let files = locate_meeting_files(dir.path(), "OS", "2021-02-09").unwrap();
        assert!(files.meeting_dir.ends_with("2021-02-09 10.00.12 OS lecture"));
        assert!(files.roster.ends_with("OS roster.csv"));
        assert!(files.participants.ends_with("participants_912345.csv"));
        assert_eq!(files.chat, Some(files.meeting_dir.join("chat.txt")));
    }

    #[test]
    fn test_missing_meeting_reports_count() {
        let dir = zoom_layout();
        let err = find_meeting_dir(dir.path(), "OS", "2021-03-01").unwrap_err();
        match err {
            AttendanceError::MeetingNotFound { found, .. } => assert_eq!(found, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_two_meetings_same_day_is_an_error() {
        let dir = zoom_layout();
        fs::create_dir(dir.path().join("2021-02-09 15.00.00 OS lab")).unwrap();
        let err = find_meeting_dir(dir.path(), "OS", "2021-02-09").unwrap_err();
        assert!(matches!(err, AttendanceError::MeetingNotFound { found: 2, .. }));
    }

    #[test]
    fn test_missing_roster() {
        let dir = zoom_layout();
        let err = find_roster_file(dir.path(), "Data Science").unwrap_err();
        assert!(matches!(err, AttendanceError::RosterNotFound { found: 0, .. }));
    }

    #[test]
    fn test_missing_participants() {
        let dir = zoom_layout();
        let meeting = dir.path().join("2021-02-09 13.58.20 Logic");
        let err = find_participants_file(&meeting).unwrap_err();
        assert!(matches!(err, AttendanceError::ParticipantsNotFound { found: 0, .. }));
    }

    #[test]
    fn test_chat_file_optional_and_saved_chat_name() {
        let dir = zoom_layout();
        let meeting = dir.path().join("2021-02-09 13.58.20 Logic");
        assert_eq!(find_chat_file(&meeting).unwrap(), None);

        touch(&meeting.join("meeting_saved_chat.txt"));
        assert_eq!(
            find_chat_file(&meeting).unwrap(),
            Some(meeting.join("meeting_saved_chat.txt"))
        );
    }

    #[test]
    fn test_missing_zoom_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = locate_meeting_files(&missing, "OS", "2021-02-09").unwrap_err();
        assert!(matches!(err, AttendanceError::DirectoryNotFound(_)));
    }
}
