use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};
use crate::models::{SessionWindow, Thresholds};
use crate::time_utils::{is_twelve_hour, parse_clock_time, parse_meeting_date};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Plot class attendance from Zoom participant and chat exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "zoom-attendance",
    about = "Plot class attendance from Zoom participant and chat exports",
    version
)]
pub struct Settings {
    /// Directory holding the roster file and one sub-directory per meeting
    pub zoom_dir: PathBuf,

    /// Course name, as used in the roster file and meeting directory names
    pub course: String,

    /// Date of the meeting, e.g. 2021-02-09
    pub meeting_date: String,

    /// Class start time, e.g. "02:00:00 PM" (remembered per course)
    pub start_time: Option<String>,

    /// Class end time, e.g. "03:50:00 PM" (remembered per course)
    pub end_time: Option<String>,

    /// Output mode
    #[arg(long, default_value = "report", value_parser = ["report", "interactive", "json"])]
    pub view: String,

    /// Plot file name, written inside the meeting directory (.png, .svg or .txt)
    #[arg(long, default_value = "attendance.png")]
    pub output: String,

    /// Also write attendance_summary.csv into the meeting directory
    #[arg(long)]
    pub summary_csv: bool,

    /// Do not write the plot file
    #[arg(long)]
    pub no_plot: bool,

    /// Minutes after the start before a student counts as late
    #[arg(long, default_value = "2")]
    pub grace_minutes: u32,

    /// Minimum fraction of the class a student must attend (0-1)
    #[arg(long, default_value = "0.9")]
    pub min_duration: f64,

    /// Unanswered questions tolerated before a student is marked absent
    #[arg(long, default_value = "1")]
    pub max_unanswered: u32,

    /// Private chats within one window needed to detect a question
    #[arg(long, default_value = "10")]
    pub question_threshold: u32,

    /// Rolling window for question detection, in seconds (1-3600)
    #[arg(long, default_value = "45", value_parser = clap::value_parser!(u32).range(1..=3600))]
    pub question_window: u32,

    /// Only accept exact, alias and case-insensitive name matches
    #[arg(long)]
    pub strict: bool,

    /// Time format
    #[arg(long, default_value = "24h", value_parser = ["12h", "24h"])]
    pub time_format: String,

    /// Display theme for the interactive view
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Plot file width in characters (60-400)
    #[arg(long, default_value = "120", value_parser = clap::value_parser!(u16).range(60..=400))]
    pub plot_width: u16,

    /// Plot file height in lines (defaults to fit the roster)
    #[arg(long)]
    pub plot_height: Option<u16>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved course schedules
    #[arg(long)]
    pub clear: bool,
}

// ── CourseSchedules ────────────────────────────────────────────────────────────

/// Start and end time of one course, as typed on the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct CourseSchedule {
    pub start_time: String,
    pub end_time: String,
}

/// Persisted course times saved to `~/.zoom-attendance/courses.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct CourseSchedules {
    #[serde(default)]
    pub courses: BTreeMap<String, CourseSchedule>,
}

impl CourseSchedules {
    /// Return the default path to the persisted schedule file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the schedule path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".zoom-attendance").join("courses.json")
    }

    /// Load schedules from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write schedules to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the schedule file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn get(&self, course: &str) -> Option<&CourseSchedule> {
        self.courses.get(course)
    }

    pub fn set(&mut self, course: &str, schedule: CourseSchedule) {
        self.courses.insert(course.to_string(), schedule);
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and fill in the class times from the saved course
    /// schedules when they were not given.
    pub fn load() -> Result<Self> {
        Self::load_impl(
            std::env::args_os().collect(),
            &CourseSchedules::config_path(),
        )
    }

    /// Full implementation: accepts args and an explicit schedule path so
    /// that tests can redirect to a temporary directory.
    pub fn load_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Result<Self> {
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            CourseSchedules::clear_at(config_path)?;
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        let mut schedules = CourseSchedules::load_from(config_path);

        match (settings.start_time.clone(), settings.end_time.clone()) {
            (Some(start_time), Some(end_time)) => {
                // Validate before persisting so a typo is never remembered.
                SessionWindow::new(
                    parse_meeting_date(&settings.meeting_date)?,
                    parse_clock_time(&start_time)?,
                    parse_clock_time(&end_time)?,
                )?;
                schedules.set(
                    &settings.course,
                    CourseSchedule {
                        start_time,
                        end_time,
                    },
                );
                if let Err(e) = schedules.save_to(config_path) {
                    tracing::warn!("Could not save course schedule: {}", e);
                }
            }
            (None, None) => {
                let saved = schedules.get(&settings.course).ok_or_else(|| {
                    AttendanceError::Config(format!(
                        "no start/end time given for course \"{}\" and none saved",
                        settings.course
                    ))
                })?;
                settings.start_time = Some(saved.start_time.clone());
                settings.end_time = Some(saved.end_time.clone());
            }
            _ => {
                return Err(AttendanceError::Config(
                    "start_time and end_time must be given together".to_string(),
                ));
            }
        }

        Ok(settings)
    }

    /// Build the session window from the date and class times.
    pub fn session_window(&self) -> Result<SessionWindow> {
        let date = parse_meeting_date(&self.meeting_date)?;
        let start = parse_clock_time(self.start_time.as_deref().unwrap_or_default())?;
        let end = parse_clock_time(self.end_time.as_deref().unwrap_or_default())?;
        SessionWindow::new(date, start, end)
    }

    /// Analysis thresholds taken from the command line.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            grace_minutes: self.grace_minutes,
            min_duration: self.min_duration,
            max_unanswered: self.max_unanswered,
            question_threshold: self.question_threshold,
            question_window_secs: self.question_window,
        }
    }

    pub fn twelve_hour(&self) -> bool {
        is_twelve_hour(&self.time_format)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
