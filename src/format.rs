//! Display helpers for distances and arrival estimates.
//!
//! Pure functions over numeric inputs; the UI layer decides where they show up.

/// Format a distance in meters for display.
///
/// Under one kilometer the value is rounded to whole meters; from one
/// kilometer upward it switches to kilometers with one decimal.
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters < 0.0 {
        return "--".to_string();
    }
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Format an ETA in seconds for display.
///
/// The backend uses 0 for "unknown" (see `Stop::eta_seconds`), so zero and
/// negative values render as `--`. Anything under a minute is "now"; minutes
/// are rounded up so a vehicle 61 seconds away shows "2 min", not "1 min".
pub fn format_eta(seconds: i32) -> String {
    if seconds <= 0 {
        return "--".to_string();
    }
    if seconds < 60 {
        return "now".to_string();
    }
    let minutes = (seconds as i64 + 59) / 60;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}
