use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

use crate::error::{AttendanceError, Result};

// ── Accepted formats ──────────────────────────────────────────────────────────

/// Date formats accepted for the meeting-date argument.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Clock-time formats accepted for the class start / end arguments.
///
/// 12-hour forms come first so that `"02:00:00 PM"` is never read as 02:00.
const TIME_FORMATS: &[&str] = &[
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I:%M:%S%p",
    "%I:%M%p",
    "%H:%M:%S",
    "%H:%M",
];

/// Join / leave timestamp formats seen in participant exports.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse the meeting date given on the command line.
///
/// ```
/// use attendance_core::time_utils::parse_meeting_date;
///
/// let d = parse_meeting_date("2021-02-09").unwrap();
/// assert_eq!(d.to_string(), "2021-02-09");
/// assert_eq!(parse_meeting_date("02/09/2021").unwrap(), d);
/// ```
pub fn parse_meeting_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| AttendanceError::InvalidDate(s.to_string()))
}

/// Parse a class start or end time such as `"02:00:00 PM"`, `"2:00 pm"` or
/// `"14:00"`.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime> {
    let normalised = s.trim().to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalised, fmt).ok())
        .ok_or_else(|| AttendanceError::InvalidTime(s.to_string()))
}

/// Parse a join / leave timestamp from a participants report.
///
/// Returns `None` for empty strings or unrecognised formats.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalised = trimmed.to_uppercase();
    let parsed = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalised, fmt).ok());
    if parsed.is_none() {
        debug!("could not parse timestamp \"{}\"", s);
    }
    parsed
}

/// Parse the `HH:MM:SS` prefix of a chat line.
pub fn parse_chat_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
        .ok()
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

/// Minutes from `from` to `to` as a fractional value (negative if `to` is
/// earlier).
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

// ── Display ───────────────────────────────────────────────────────────────────

/// Format a clock value for display.
///
/// * `twelve_hour = false` → `"14:05"`
/// * `twelve_hour = true`  → `"2:05 PM"`
pub fn format_clock(t: NaiveDateTime, twelve_hour: bool) -> String {
    if twelve_hour {
        let (pm, hour) = t.hour12();
        format!(
            "{}:{:02} {}",
            hour,
            t.minute(),
            if pm { "PM" } else { "AM" }
        )
    } else {
        t.format("%H:%M").to_string()
    }
}

/// Decide whether to use 12-hour clock display from the `--time-format`
/// value.  Anything other than `"12h"` means 24-hour.
pub fn is_twelve_hour(time_format: &str) -> bool {
    time_format.eq_ignore_ascii_case("12h")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    // ── parse_meeting_date ────────────────────────────────────────────────────

    #[test]
    fn test_parse_meeting_date_iso() {
        let d = parse_meeting_date("2021-02-09").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 2, 9).unwrap());
    }

    #[test]
    fn test_parse_meeting_date_us() {
        let d = parse_meeting_date("02/09/2021").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 2, 9).unwrap());
    }

    #[test]
    fn test_parse_meeting_date_invalid() {
        let err = parse_meeting_date("yesterday").unwrap_err();
        assert_eq!(err.to_string(), "Invalid date: yesterday");
    }

    // ── parse_clock_time ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_clock_time_twelve_hour_with_seconds() {
        let t = parse_clock_time("02:00:00 PM").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_clock_time_morning() {
        let t = parse_clock_time("10:00:00 AM").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_clock_time_lowercase_no_seconds() {
        let t = parse_clock_time("3:50 pm").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
    }

    #[test]
    fn test_parse_clock_time_twenty_four_hour() {
        assert_eq!(
            parse_clock_time("14:00").unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("11:20:30").unwrap(),
            NaiveTime::from_hms_opt(11, 20, 30).unwrap()
        );
    }

    #[test]
    fn test_parse_clock_time_invalid() {
        assert!(parse_clock_time("noon-ish").is_err());
        assert!(parse_clock_time("").is_err());
    }

    // ── parse_timestamp ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_zoom_us_format() {
        let t = parse_timestamp("02/09/2021 01:58:31 PM").unwrap();
        assert_eq!(t, dt("2021-02-09 13:58:31"));
    }

    #[test]
    fn test_parse_timestamp_iso_formats() {
        assert_eq!(
            parse_timestamp("2021-02-09 13:58:31").unwrap(),
            dt("2021-02-09 13:58:31")
        );
        assert_eq!(
            parse_timestamp("2021-02-09T13:58:31").unwrap(),
            dt("2021-02-09 13:58:31")
        );
    }

    #[test]
    fn test_parse_timestamp_empty_and_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not a time").is_none());
    }

    // ── parse_chat_time ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_chat_time() {
        assert_eq!(
            parse_chat_time("14:05:12").unwrap(),
            NaiveTime::from_hms_opt(14, 5, 12).unwrap()
        );
        assert!(parse_chat_time("From").is_none());
    }

    // ── minutes_between ───────────────────────────────────────────────────────

    #[test]
    fn test_minutes_between() {
        let a = dt("2021-02-09 14:00:00");
        let b = dt("2021-02-09 15:50:30");
        assert!((minutes_between(a, b) - 110.5).abs() < 1e-9);
        assert!((minutes_between(b, a) + 110.5).abs() < 1e-9);
    }

    // ── format_clock ──────────────────────────────────────────────────────────

    #[test]
    fn test_format_clock_24h() {
        assert_eq!(format_clock(dt("2021-02-09 14:05:00"), false), "14:05");
    }

    #[test]
    fn test_format_clock_12h() {
        assert_eq!(format_clock(dt("2021-02-09 14:05:00"), true), "2:05 PM");
        assert_eq!(format_clock(dt("2021-02-09 00:30:00"), true), "12:30 AM");
    }

    #[test]
    fn test_is_twelve_hour() {
        assert!(is_twelve_hour("12h"));
        assert!(is_twelve_hour("12H"));
        assert!(!is_twelve_hour("24h"));
        assert!(!is_twelve_hour("auto"));
    }
}
