//! Roster, participants-report and chat-log loading.
//!
//! Converts vendor exports into [`Roster`], [`ParticipantRecord`] and
//! [`ChatMessage`] values for downstream matching.  Malformed rows are
//! skipped and counted rather than failing the whole file.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::models::{ChatMessage, ParticipantRecord, Roster, RosterEntry};
use attendance_core::names::clean_display_name;
use attendance_core::time_utils::{parse_chat_time, parse_timestamp};
use chrono::NaiveDate;
use tracing::{debug, warn};

// ── Roster ────────────────────────────────────────────────────────────────────

/// Load a roster CSV with `First name`, `Last name` and optional `alias`
/// columns.
///
/// Header matching ignores case, surrounding whitespace and a UTF-8 BOM.
/// Rows with neither a first nor a last name are skipped; duplicate names
/// keep the first row.
pub fn read_roster(path: &Path) -> Result<Roster> {
    let mut reader = csv_reader(path, true)?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();

    let first_idx = column_index(&headers, "first name")
        .ok_or_else(|| missing_column(path, "First name"))?;
    let last_idx =
        column_index(&headers, "last name").ok_or_else(|| missing_column(path, "Last name"))?;
    let alias_idx = column_index(&headers, "alias");

    let mut roster = Roster::new();
    for result in reader.records() {
        let record = result.map_err(|source| csv_error(path, source))?;
        let first = record.get(first_idx).unwrap_or_default();
        let last = record.get(last_idx).unwrap_or_default();
        if first.trim().is_empty() && last.trim().is_empty() {
            continue;
        }
        let alias = alias_idx.and_then(|i| record.get(i));
        let entry = RosterEntry::new(first, last, alias);
        let name = entry.full_name();
        if !roster.push(entry) {
            warn!("Duplicate roster entry {} in {}", name, path.display());
        }
    }

    debug!("Roster {}: {} students", path.display(), roster.len());
    Ok(roster)
}

// ── Participants ──────────────────────────────────────────────────────────────

/// Load a participants report.
///
/// Columns are positional: name, email, join time, leave time, duration in
/// minutes, guest flag; anything after is ignored.  A leading meeting
/// summary block (`Meeting ID,Topic,...`) is skipped up to the real
/// `Name ...` header.  Rows whose join/leave times cannot be parsed are
/// dropped.
pub fn read_participants(path: &Path) -> Result<Vec<ParticipantRecord>> {
    let mut reader = csv_reader(path, true)?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    let mut in_preamble = headers
        .get(0)
        .map(|h| normalise_header(h).starts_with("meeting id"))
        .unwrap_or(false);

    let mut rows_read = 0u64;
    let mut rows_skipped = 0u64;
    let mut records = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable row in {}: {}", path.display(), e);
                rows_skipped += 1;
                continue;
            }
        };

        if in_preamble {
            if record
                .get(0)
                .map(|f| normalise_header(f).starts_with("name"))
                .unwrap_or(false)
            {
                in_preamble = false;
            }
            continue;
        }

        rows_read += 1;
        match map_participant_row(&record) {
            Some(p) => records.push(p),
            None => {
                debug!("Skipping participant row {:?} in {}", record, path.display());
                rows_skipped += 1;
            }
        }
    }

    debug!(
        "Participants {}: {} read, {} skipped, {} kept",
        path.display(),
        rows_read,
        rows_skipped,
        records.len()
    );
    Ok(records)
}

fn map_participant_row(record: &csv::StringRecord) -> Option<ParticipantRecord> {
    let raw_name = clean_display_name(record.get(0)?);
    if raw_name.is_empty() {
        return None;
    }
    let join = parse_timestamp(record.get(2)?)?;
    let leave = parse_timestamp(record.get(3)?)?;
    let reported_minutes = record
        .get(4)
        .and_then(|d| d.trim().parse::<u32>().ok())
        .unwrap_or(0);

    Some(ParticipantRecord {
        raw_name,
        email: record.get(1).unwrap_or_default().trim().to_string(),
        join,
        leave,
        reported_minutes,
    })
}

// ── Chat ──────────────────────────────────────────────────────────────────────

/// Load a chat log, stamping every message with `meeting_date`.
///
/// Lines that are not message headers (continuations of multi-line
/// messages, blank lines) are ignored.
pub fn read_chat(path: &Path, meeting_date: NaiveDate) -> Result<Vec<ChatMessage>> {
    let file = File::open(path).map_err(|source| AttendanceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines_read = 0u64;
    let mut messages = Vec::new();
    for bytes in BufReader::new(file).split(b'\n') {
        let bytes = bytes.map_err(|source| AttendanceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        lines_read += 1;
        let line = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = line {
            debug!(
                "Chat line {} in {} is not valid UTF-8; decoding lossily",
                lines_read,
                path.display()
            );
        }
        if let Some(message) = parse_chat_line(&line, meeting_date) {
            messages.push(message);
        }
    }

    debug!(
        "Chat {}: {} lines, {} messages",
        path.display(),
        lines_read,
        messages.len()
    );
    Ok(messages)
}

/// Parse one chat line.
///
/// Accepted shapes:
///
/// ```text
/// 14:05:12	 From  Jane Doe : hello
/// 14:05:40	 From  Jane Doe  to  Glenn Bruns(Direct Message) : B
/// 14:06:02 From Jane Doe to Everyone: hi all
/// ```
///
/// The sender/recipient header ends at the first colon after `From`.  A
/// message is private when its recipient is not `Everyone`, or when the
/// header mentions `Direct`.
pub fn parse_chat_line(line: &str, meeting_date: NaiveDate) -> Option<ChatMessage> {
    let line = line.trim_end_matches(['\r', '\n']);
    if !line.chars().next()?.is_ascii_digit() {
        return None;
    }

    let (time_token, rest) = line.split_once(char::is_whitespace)?;
    let time = parse_chat_time(time_token)?;

    let from_idx = rest.find("From ")?;
    let after = &rest[from_idx + "From ".len()..];
    // Names and recipients never contain a colon; the message text may.
    let (header, text) = after.split_once(':')?;

    let (name_part, recipient) = match header.split_once(" to ") {
        Some((name, to)) => (name, Some(to.trim())),
        None => (header, None),
    };
    let raw_name = clean_display_name(name_part);
    if raw_name.is_empty() {
        return None;
    }

    let private = header.contains("Direct")
        || recipient
            .map(|r| !clean_display_name(r).eq_ignore_ascii_case("everyone"))
            .unwrap_or(false);

    Some(ChatMessage {
        raw_name,
        timestamp: meeting_date.and_time(time),
        private,
        recipient: recipient.map(clean_display_name),
        text: text.trim().to_string(),
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn csv_reader(path: &Path, has_headers: bool) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| AttendanceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, source: csv::Error) -> AttendanceError {
    AttendanceError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn missing_column(path: &Path, column: &str) -> AttendanceError {
    AttendanceError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    }
}

/// Lowercased header text without a BOM or surrounding whitespace.
fn normalise_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn column_index(headers: &csv::StringRecord, wanted: &str) -> Option<usize> {
    headers.iter().position(|h| normalise_header(h) == wanted)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
