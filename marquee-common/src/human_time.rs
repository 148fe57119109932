//! Human-readable duration and distance formatting
//!
//! Used in plan summaries and issue messages shown to end users.

/// Format a duration in seconds.
///
/// # Examples
///
/// ```
/// use marquee_common::human_time::format_duration;
///
/// assert_eq!(format_duration(45), "45 seconds");
/// assert_eq!(format_duration(600), "10 minutes");
/// assert_eq!(format_duration(7200), "2 hours");
/// assert_eq!(format_duration(5400), "1 hour 30 minutes");
/// ```
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{} {}", seconds, plural(seconds, "second"));
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} {}", minutes, plural(minutes, "minute"));
    }

    let hours = minutes / 60;
    let minutes = minutes % 60;
    if minutes == 0 {
        format!("{} {}", hours, plural(hours, "hour"))
    } else {
        format!(
            "{} {} {} {}",
            hours,
            plural(hours, "hour"),
            minutes,
            plural(minutes, "minute")
        )
    }
}

/// Format a distance in meters.
///
/// # Examples
///
/// ```
/// use marquee_common::human_time::format_distance;
///
/// assert_eq!(format_distance(420), "420 meters");
/// assert_eq!(format_distance(1250), "1.3 kilometers");
/// ```
pub fn format_distance(meters: u64) -> String {
    if meters < 1000 {
        return format!("{} meters", meters);
    }
    format!("{:.1} kilometers", meters as f64 / 1000.0)
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
