//! Per-student summary export.

use std::path::Path;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::models::AttendanceReport;
use serde::Serialize;
use tracing::info;

/// One CSV row; column names follow the field names.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    name: &'a str,
    joined: bool,
    first_join: String,
    minutes_present: String,
    frac_duration: String,
    is_late: bool,
    chat_messages: u32,
    num_unanswered: u32,
    fraction_unanswered: String,
    is_absent: bool,
}

/// Write one row per student, in display order, to `path`.
///
/// Fractions and minutes are rounded to two decimals; a student who never
/// joined has an empty `first_join`.
pub fn write_summary_csv(report: &AttendanceReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| AttendanceError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    for s in &report.students {
        let row = SummaryRow {
            name: &s.name,
            joined: s.joined,
            first_join: s
                .first_join
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            minutes_present: format!("{:.2}", s.minutes_present),
            frac_duration: format!("{:.2}", s.frac_duration),
            is_late: s.is_late,
            chat_messages: s.chat_messages,
            num_unanswered: s.num_unanswered,
            fraction_unanswered: format!("{:.2}", s.fraction_unanswered),
            is_absent: s.is_absent,
        };
        writer.serialize(row).map_err(|source| AttendanceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush()?;

    info!(
        "Wrote summary for {} students to {}",
        report.students.len(),
        path.display()
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
