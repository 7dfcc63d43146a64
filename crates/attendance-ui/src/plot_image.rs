//! PNG plot export.
//!
//! Lays the attendance timeline out as an SVG document, rasterises it with
//! `resvg` and encodes the pixels with `image`.  The picture carries the same
//! marks as the terminal chart: one bar per join/leave interval (red when the
//! student was late), window and late-cutoff lines, question edges and a dot
//! for every unanswered question.  Absent students are named in red.

use std::path::Path;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::models::AttendanceReport;
use attendance_core::time_utils::format_clock;
use chrono::NaiveDateTime;
use resvg::{tiny_skia, usvg};
use tracing::{debug, info};

use crate::chart::axis_ticks;
use crate::components::header::chart_title;

/// Image width in pixels.
pub const IMAGE_WIDTH: u32 = 1400;

const NAME_PANEL: f64 = 220.0;
const RIGHT_MARGIN: f64 = 30.0;
const TOP_MARGIN: f64 = 70.0;
const BOTTOM_MARGIN: f64 = 50.0;
const ROW_HEIGHT: f64 = 26.0;
const BAR_WIDTH: f64 = 4.0;
const DOT_RADIUS: f64 = 5.0;
/// Horizontal room per axis label.
const TICK_SPACING: f64 = 70.0;

pub const WINDOW_COLOUR: &str = "black";
pub const LATE_CUTOFF_COLOUR: &str = "orange";
pub const BAR_COLOUR: &str = "darkgrey";
pub const LATE_BAR_COLOUR: &str = "red";
pub const QUESTION_COLOUR: &str = "dodgerblue";
pub const UNANSWERED_COLOUR: &str = "red";
pub const ABSENT_COLOUR: &str = "red";

// ── Geometry ──────────────────────────────────────────────────────────────────

struct Layout {
    start: NaiveDateTime,
    span_ms: f64,
    plot_left: f64,
    plot_right: f64,
    rows_top: f64,
    rows_bottom: f64,
    height: f64,
}

impl Layout {
    fn new(report: &AttendanceReport) -> Self {
        let rows = report.students.len().max(1) as f64;
        let rows_bottom = TOP_MARGIN + rows * ROW_HEIGHT;
        Self {
            start: report.window.start,
            span_ms: (report.window.end - report.window.start)
                .num_milliseconds()
                .max(1) as f64,
            plot_left: NAME_PANEL,
            plot_right: f64::from(IMAGE_WIDTH) - RIGHT_MARGIN,
            rows_top: TOP_MARGIN,
            rows_bottom,
            height: rows_bottom + BOTTOM_MARGIN,
        }
    }

    /// x of `t`; instants outside the window snap to the edges.
    fn x(&self, t: NaiveDateTime) -> f64 {
        let offset = ((t - self.start).num_milliseconds() as f64).clamp(0.0, self.span_ms);
        self.plot_left + offset / self.span_ms * (self.plot_right - self.plot_left)
    }

    /// Vertical centre of display row `id`.
    fn y(&self, id: usize) -> f64 {
        self.rows_top + (id as f64 + 0.5) * ROW_HEIGHT
    }
}

/// Escape text for use inside an SVG element or attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn line(svg: &mut String, (x1, y1): (f64, f64), (x2, y2): (f64, f64), colour: &str, width: f64) {
    svg.push_str(&format!(
        "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{colour}\" stroke-width=\"{width}\"/>\n"
    ));
}

fn text(svg: &mut String, x: f64, y: f64, anchor: &str, fill: &str, size: u32, content: &str) {
    svg.push_str(&format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"{anchor}\" fill=\"{fill}\" font-size=\"{size}\">{}</text>\n",
        escape(content)
    ));
}

// ── SVG ───────────────────────────────────────────────────────────────────────

/// The attendance timeline as a standalone SVG document.
pub fn render_svg(report: &AttendanceReport, twelve_hour: bool) -> String {
    let layout = Layout::new(report);
    let width = f64::from(IMAGE_WIDTH);
    let (top, bottom) = (layout.rows_top, layout.rows_bottom);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h:.0}\" viewBox=\"0 0 {w} {h:.0}\" font-family=\"sans-serif\">\n",
        w = IMAGE_WIDTH,
        h = layout.height
    );
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    text(&mut svg, width / 2.0, 30.0, "middle", "black", 20, &chart_title(report));
    render_legend(&mut svg, &layout);

    // Window, late cutoff and question edges go under the bars.
    let window = &report.window;
    for t in [window.start, window.end] {
        line(&mut svg, (layout.x(t), top), (layout.x(t), bottom), WINDOW_COLOUR, 1.5);
    }
    let late = layout.x(report.late_cutoff);
    line(&mut svg, (late, top), (late, bottom), LATE_CUTOFF_COLOUR, 1.5);
    for period in &report.question_periods {
        for t in [period.start, period.end] {
            line(&mut svg, (layout.x(t), top), (layout.x(t), bottom), QUESTION_COLOUR, 1.0);
        }
    }

    for student in &report.students {
        let y = layout.y(student.id);
        let name_colour = if student.is_absent { ABSENT_COLOUR } else { "black" };
        text(&mut svg, NAME_PANEL - 10.0, y + 5.0, "end", name_colour, 14, &student.name);

        let bar_colour = if student.is_late { LATE_BAR_COLOUR } else { BAR_COLOUR };
        for record in report.records_for(&student.name) {
            line(
                &mut svg,
                (layout.x(record.join), y),
                (layout.x(record.leave), y),
                bar_colour,
                BAR_WIDTH,
            );
        }
    }

    for question in &report.unanswered {
        let Some(period) = report.question_periods.get(question.period) else {
            continue;
        };
        let x = layout.x(period.midpoint());
        for name in &question.students {
            if let Some(student) = report.student(name) {
                svg.push_str(&format!(
                    "<circle cx=\"{x:.1}\" cy=\"{:.1}\" r=\"{DOT_RADIUS}\" fill=\"{UNANSWERED_COLOUR}\"/>\n",
                    layout.y(student.id)
                ));
            }
        }
    }

    render_axis(&mut svg, &layout, report, twelve_hour);
    svg.push_str("</svg>\n");
    svg
}

fn render_legend(svg: &mut String, layout: &Layout) {
    let entries = [
        (BAR_COLOUR, "present"),
        (LATE_BAR_COLOUR, "late"),
        (WINDOW_COLOUR, "start/end"),
        (LATE_CUTOFF_COLOUR, "late cutoff"),
        (QUESTION_COLOUR, "question"),
    ];
    let y = 52.0;
    let mut x = layout.plot_left;
    for (colour, label) in entries {
        line(svg, (x, y - 4.0), (x + 24.0, y - 4.0), colour, BAR_WIDTH);
        text(svg, x + 30.0, y, "start", "dimgray", 12, label);
        x += 130.0;
    }
    svg.push_str(&format!(
        "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{DOT_RADIUS}\" fill=\"{UNANSWERED_COLOUR}\"/>\n",
        x + 12.0,
        y - 4.0
    ));
    text(svg, x + 30.0, y, "start", "dimgray", 12, "unanswered");
}

fn render_axis(svg: &mut String, layout: &Layout, report: &AttendanceReport, twelve_hour: bool) {
    let y = layout.rows_bottom;
    line(svg, (layout.plot_left, y), (layout.plot_right, y), "black", 1.0);

    let max_ticks = ((layout.plot_right - layout.plot_left) / TICK_SPACING) as usize;
    for t in axis_ticks(report.window.start, report.window.end, max_ticks) {
        let x = layout.x(t);
        line(svg, (x, y), (x, y + 6.0), "black", 1.0);
        text(svg, x, y + 22.0, "middle", "black", 12, &format_clock(t, twelve_hour));
    }
}

// ── PNG ───────────────────────────────────────────────────────────────────────

/// Rasterise the timeline and write it to `path` as PNG.
///
/// System fonts are loaded for the labels; without any fonts the marks are
/// still drawn.
pub fn write_png(report: &AttendanceReport, path: &Path, twelve_hour: bool) -> Result<()> {
    let render_error = |message: String| AttendanceError::Render {
        path: path.to_path_buf(),
        message,
    };

    let svg = render_svg(report, twelve_hour);
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    debug!("Loaded {} font faces for the plot", options.fontdb.len());

    let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| render_error(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        render_error(format!(
            "cannot allocate a {}x{} image",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // The background is opaque, so premultiplied and straight RGBA agree.
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .ok_or_else(|| render_error("pixel buffer has the wrong size".to_string()))?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| render_error(e.to_string()))?;

    info!(
        "Wrote {}x{} attendance image to {}",
        size.width(),
        size.height(),
        path.display()
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
