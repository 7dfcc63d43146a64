//! Plot export.
//!
//! The text plot renders [`AttendanceChart`] into an off-screen [`Buffer`]
//! and writes the cell symbols out line by line, without colour.  Image
//! output is handled by [`crate::plot_image`].

use std::path::Path;

use attendance_core::error::Result;
use attendance_core::models::AttendanceReport;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::chart::AttendanceChart;
use crate::plot_image::{render_svg, write_png};
use crate::themes::Theme;

/// Render the chart to text, `width` columns wide.
///
/// `height` defaults to one row per student plus the chart chrome.
pub fn render_to_string(
    report: &AttendanceReport,
    width: u16,
    height: Option<u16>,
    twelve_hour: bool,
) -> String {
    let theme = Theme::classic();
    let chart = AttendanceChart::new(report, &theme, twelve_hour);
    let height = height.unwrap_or_else(|| chart.required_height());

    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    (&chart).render(area, &mut buf);
    buffer_to_string(&buf)
}

/// Cell symbols of `buf`, one line per row with trailing blanks removed.
///
/// The cells hidden behind a wide character are skipped.
pub fn buffer_to_string(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let mut line = String::new();
        let mut x = area.left();
        while x < area.right() {
            let symbol = buf[(x, y)].symbol();
            line.push_str(symbol);
            x += symbol.width().max(1) as u16;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Output format picked from the plot file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Text,
    Svg,
    Png,
}

impl PlotFormat {
    /// `.txt` gives the text plot, `.svg` the vector image, anything else PNG.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => PlotFormat::Text,
            Some("svg") => PlotFormat::Svg,
            _ => PlotFormat::Png,
        }
    }
}

/// Write the plot for `report` to `path` in the format its extension names.
///
/// `width` and `height` size the text plot in cells; images have a fixed
/// width and grow with the roster.
pub fn write_plot_file(
    report: &AttendanceReport,
    path: &Path,
    width: u16,
    height: Option<u16>,
    twelve_hour: bool,
) -> Result<()> {
    match PlotFormat::from_path(path) {
        PlotFormat::Text => {
            let text = render_to_string(report, width, height, twelve_hour);
            std::fs::write(path, text)?;
        }
        PlotFormat::Svg => std::fs::write(path, render_svg(report, twelve_hour))?,
        PlotFormat::Png => return write_png(report, path, twelve_hour),
    }
    info!("Wrote attendance plot to {}", path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
