//! Plain-text console summary printed by the report view.

use attendance_core::formatting::format_name_list;
use attendance_core::models::AttendanceReport;
use attendance_core::time_utils::format_clock;
use unicode_width::UnicodeWidthStr;

use crate::components::header::chart_title;
use crate::table_view::{table_data, HEADERS};

/// Pad `s` with spaces to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

fn format_row(row: &[&str; 8], widths: &[usize; 8]) -> String {
    let cells: Vec<String> = row
        .iter()
        .zip(widths.iter())
        .map(|(cell, w)| pad(cell, *w))
        .collect();
    cells.join("  ").trim_end().to_string()
}

/// Multi-line summary: title, aligned per-student table, totals, then the
/// unknown and ambiguous names.
pub fn format_summary(report: &AttendanceReport, twelve_hour: bool) -> String {
    let (rows, totals) = table_data(report, twelve_hour);
    let mut out = String::new();

    out.push_str(&format!(
        "{} ({} - {}, late after {})\n",
        chart_title(report),
        format_clock(report.window.start, twelve_hour),
        format_clock(report.window.end, twelve_hour),
        format_clock(report.late_cutoff, twelve_hour),
    ));

    let cells: Vec<[&str; 8]> = rows
        .iter()
        .map(|r| {
            [
                r.name.as_str(),
                r.status.as_str(),
                r.minutes.as_str(),
                r.duration.as_str(),
                r.first_join.as_str(),
                r.late.as_str(),
                r.chat.as_str(),
                r.unanswered.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.width());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    out.push_str(&format_row(&HEADERS, &widths));
    out.push('\n');
    for row in &cells {
        out.push_str(&format_row(row, &widths));
        out.push('\n');
    }

    out.push_str(&format!(
        "{} students: {} present, {} absent, {} late; {} question periods\n",
        totals.students, totals.present, totals.absent, totals.late, totals.questions
    ));
    out.push_str(&format!(
        "Unknown names: {}\n",
        format_name_list(&report.unknown_names)
    ));
    for a in &report.ambiguous_names {
        out.push_str(&format!(
            "Ambiguous name: {} -> {}\n",
            a.raw_name,
            format_name_list(&a.candidates)
        ));
    }
    out
}
