use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the attendance tools.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required CSV column is missing from the header row.
    #[error("Missing column \"{column}\" in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date argument did not match any recognised format.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A clock-time argument did not match any recognised format.
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// The session window ends at or before its start.
    #[error("Invalid session window: end {end} is not after start {start}")]
    InvalidWindow { start: String, end: String },

    /// Zero or several meeting directories matched the course and date.
    #[error("not exactly 1 zoom meeting for {course} on date {date} in {dir} (found {found})")]
    MeetingNotFound {
        course: String,
        date: String,
        dir: PathBuf,
        found: usize,
    },

    /// Zero or several roster files matched the course.
    #[error("No single roster file {course}*.csv in {dir} (found {found})")]
    RosterNotFound {
        course: String,
        dir: PathBuf,
        found: usize,
    },

    /// Zero or several participant reports in the meeting directory.
    #[error("not exactly 1 participation file in {dir} (found {found})")]
    ParticipantsNotFound { dir: PathBuf, found: usize },

    /// The expected input directory does not exist.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The plot image could not be rasterised or encoded.
    #[error("Failed to render plot {path}: {message}")]
    Render { path: PathBuf, message: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the attendance crates.
pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AttendanceError::FileRead {
            path: PathBuf::from("/zoom/chat.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/zoom/chat.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = AttendanceError::MissingColumn {
            path: PathBuf::from("OS.csv"),
            column: "Last name".to_string(),
        };
        assert_eq!(err.to_string(), "Missing column \"Last name\" in OS.csv");
    }

    #[test]
    fn test_error_display_invalid_time() {
        let err = AttendanceError::InvalidTime("25:99".to_string());
        assert_eq!(err.to_string(), "Invalid time: 25:99");
    }

    #[test]
    fn test_error_display_meeting_not_found() {
        let err = AttendanceError::MeetingNotFound {
            course: "Logic".to_string(),
            date: "2021-02-09".to_string(),
            dir: PathBuf::from("/zoom"),
            found: 0,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("not exactly 1 zoom meeting for Logic on date 2021-02-09"));
        assert!(msg.contains("found 0"));
    }

    #[test]
    fn test_error_display_roster_not_found() {
        let err = AttendanceError::RosterNotFound {
            course: "OS".to_string(),
            dir: PathBuf::from("/zoom"),
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "No single roster file OS*.csv in /zoom (found 2)"
        );
    }

    #[test]
    fn test_error_display_invalid_window() {
        let err = AttendanceError::InvalidWindow {
            start: "14:00".to_string(),
            end: "13:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid session window: end 13:00 is not after start 14:00"
        );
    }

    #[test]
    fn test_error_display_render() {
        let err = AttendanceError::Render {
            path: PathBuf::from("attendance.png"),
            message: "encoder failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to render plot attendance.png: encoder failed"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AttendanceError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: AttendanceError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
