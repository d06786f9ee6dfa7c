use std::time::Duration;

/// Phrase used when the duration has no whole second in it.
pub const LESS_THAN_ONE_SECOND: &str = "less than 1 second";

const UNITS: [(&str, &str, u64); 4] = [
    ("day", "days", 60 * 60 * 24),
    ("hour", "hours", 60 * 60),
    ("minute", "minutes", 60),
    ("second", "seconds", 1),
];

/// Coarse, human readable duration: at most the two largest non-zero units.
///
/// `format_duration(Duration::from_secs(3661))` is `"1 hour, 1 minute"`.
/// Fractions of a second are truncated.
pub fn format_duration(duration: Duration) -> String {
    let mut remaining = duration.as_secs();
    let mut parts = Vec::with_capacity(2);
    for (singular, plural, unit_secs) in UNITS {
        let value = remaining / unit_secs;
        remaining %= unit_secs;
        if value == 0 {
            continue;
        }
        let name = if value == 1 { singular } else { plural };
        parts.push(format!("{value} {name}"));
        if parts.len() == 2 {
            break;
        }
    }

    if parts.is_empty() {
        LESS_THAN_ONE_SECOND.to_string()
    } else {
        parts.join(", ")
    }
}

/// Same as [`format_duration`] for a possibly fractional or negative second
/// count. Negative and non-finite values are treated as zero.
pub fn format_seconds(seconds: f64) -> String {
    format_duration(Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::ZERO))
}
