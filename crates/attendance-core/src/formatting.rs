/// Format a duration in minutes as a human-readable string.
///
/// * `< 60` minutes → `"45m"`
/// * `≥ 60` minutes, no remainder → `"2h"`
/// * `≥ 60` minutes, with remainder → `"1h 50m"`
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(45.0),  "45m");
/// assert_eq!(format_minutes(120.0), "2h");
/// assert_eq!(format_minutes(110.0), "1h 50m");
/// assert_eq!(format_minutes(0.0),   "0m");
/// ```
pub fn format_minutes(minutes: f64) -> String {
    let total_mins = minutes.max(0.0).round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use attendance_core::formatting::percentage;
///
/// assert!((percentage(99.0, 110.0, 1) - 90.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Format a 0–1 fraction as a whole percentage, e.g. `0.934` → `"93%"`.
pub fn format_fraction(fraction: f64) -> String {
    format!("{}%", percentage(fraction, 1.0, 0) as i64)
}

/// Format names the way the console summary lists them:
/// `["Ann Lee", "Bo Li"]` → `"[Ann Lee, Bo Li]"`.
pub fn format_name_list(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

/// `"yes"` / `"no"` for boolean summary columns.
pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
