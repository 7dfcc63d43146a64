mod bootstrap;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use attendance_core::models::AttendanceReport;
use attendance_core::settings::Settings;
use attendance_data::analysis::analyze_meeting;
use attendance_data::discovery::{locate_meeting_files, MeetingFiles};
use attendance_data::summary_csv::write_summary_csv;
use attendance_ui::app::App;
use attendance_ui::export::write_plot_file;
use attendance_ui::summary::format_summary;

/// File name of the per-student CSV written with `--summary-csv`.
const SUMMARY_CSV_NAME: &str = "attendance_summary.csv";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    bootstrap::ensure_directories()?;
    let settings = Settings::load()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("zoom-attendance v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Course: {}, Date: {}, View: {}",
        settings.course,
        settings.meeting_date,
        settings.view
    );

    let window = settings.session_window()?;
    let files = locate_meeting_files(&settings.zoom_dir, &settings.course, &settings.meeting_date)?;
    let report = analyze_meeting(
        &files,
        &settings.course,
        &window,
        &settings.thresholds(),
        !settings.strict,
    )?;

    match settings.view.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        "interactive" => {
            write_outputs(&settings, &files, &report)?;
            App::new(&settings.theme, report, settings.twelve_hour())
                .run()
                .context("interactive view failed")?;
        }
        _ => {
            print!("{}", format_summary(&report, settings.twelve_hour()));
            for path in write_outputs(&settings, &files, &report)? {
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

/// Write the plot file and, if requested, the summary CSV into the meeting
/// directory.  Returns the paths written.
fn write_outputs(
    settings: &Settings,
    files: &MeetingFiles,
    report: &AttendanceReport,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if !settings.no_plot {
        let path = files.meeting_dir.join(&settings.output);
        write_plot_file(
            report,
            &path,
            settings.plot_width,
            settings.plot_height,
            settings.twelve_hour(),
        )
        .with_context(|| format!("cannot write plot file {}", path.display()))?;
        written.push(path);
    }

    if settings.summary_csv {
        let path = files.meeting_dir.join(SUMMARY_CSV_NAME);
        write_summary_csv(report, &path)?;
        written.push(path);
    }

    Ok(written)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::models::Thresholds;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::TempDir;

    fn zoom_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("OS.csv"),
            "First name,Last name,alias\nAnn,Lee,\nBo,Li,Bobby\n",
        )
        .unwrap();
        let meeting = dir.path().join("2021-02-09 13.58.20 OS");
        fs::create_dir(&meeting).unwrap();
        fs::write(
            meeting.join("participants_1.csv"),
            "Name (Original Name),User Email,Join Time,Leave Time,Duration (Minutes),Guest\n\
             Ann Lee,,02/09/2021 02:00:00 PM,02/09/2021 03:40:00 PM,100,No\n\
             Bobby,,02/09/2021 02:30:00 PM,02/09/2021 03:40:00 PM,70,No\n",
        )
        .unwrap();
        dir
    }

    fn settings(dir: &TempDir, extra: &[&str]) -> Settings {
        let mut args: Vec<OsString> = vec![
            "zoom-attendance".into(),
            dir.path().as_os_str().to_owned(),
            "OS".into(),
            "2021-02-09".into(),
            "2:00 PM".into(),
            "3:40 PM".into(),
        ];
        args.extend(extra.iter().map(OsString::from));
        Settings::load_impl(args, &dir.path().join("courses.json")).unwrap()
    }

    fn analyse(settings: &Settings) -> (MeetingFiles, AttendanceReport) {
        let files =
            locate_meeting_files(&settings.zoom_dir, &settings.course, &settings.meeting_date)
                .unwrap();
        let report = analyze_meeting(
            &files,
            &settings.course,
            &settings.session_window().unwrap(),
            &settings.thresholds(),
            !settings.strict,
        )
        .unwrap();
        (files, report)
    }

    #[test]
    fn test_write_outputs_plot_and_csv() {
        let dir = zoom_dir();
        let settings = settings(&dir, &["--summary-csv", "--output", "plot.txt"]);
        let (files, report) = analyse(&settings);

        let written = write_outputs(&settings, &files, &report).unwrap();
        assert_eq!(
            written,
            vec![
                files.meeting_dir.join("plot.txt"),
                files.meeting_dir.join(SUMMARY_CSV_NAME)
            ]
        );
        let plot = fs::read_to_string(&written[0]).unwrap();
        assert!(plot.contains("OS Attendance, 2/9"));
        assert!(plot.contains("* Bo Li"));
        let csv = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_write_outputs_default_plot_is_png() {
        let dir = zoom_dir();
        let settings = settings(&dir, &[]);
        let (files, report) = analyse(&settings);

        let written = write_outputs(&settings, &files, &report).unwrap();
        assert_eq!(written, vec![files.meeting_dir.join("attendance.png")]);
        assert!(fs::read(&written[0]).unwrap().starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn test_write_outputs_no_plot() {
        let dir = zoom_dir();
        let settings = settings(&dir, &["--no-plot"]);
        let (files, report) = analyse(&settings);
        assert!(write_outputs(&settings, &files, &report).unwrap().is_empty());
        assert!(!files.meeting_dir.join("attendance.png").exists());
    }

    #[test]
    fn test_thresholds_flow_into_report() {
        let dir = zoom_dir();
        let settings = settings(&dir, &["--grace-minutes", "45", "--min-duration", "0.5"]);
        let (_, report) = analyse(&settings);
        assert_eq!(
            report.thresholds,
            Thresholds {
                grace_minutes: 45,
                min_duration: 0.5,
                ..Thresholds::default()
            }
        );
        // Bo joined 30 minutes in and stayed 70 of 100 minutes.
        assert!(!report.student("Bo Li").unwrap().is_absent);
    }

    #[test]
    fn test_json_view_serialises_report() {
        let dir = zoom_dir();
        let settings = settings(&dir, &["--view", "json"]);
        let (_, report) = analyse(&settings);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&report).unwrap()).unwrap();
        assert_eq!(json["course"], "OS");
        assert_eq!(json["students"].as_array().unwrap().len(), 2);
    }
}
