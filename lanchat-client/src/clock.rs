//! Wall-clock helpers
//!
//! Protocol timestamps (topic time, liveness, logon time) are milliseconds
//! since the Unix epoch. Durations measured inside a transfer use the
//! monotonic clock instead.

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as local time for display
pub fn format_timestamp(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S, %d. %b. %y")
            .to_string(),
        None => String::new(),
    }
}

/// Format an elapsed duration in milliseconds as "1d 2h 3m" style text
pub fn format_elapsed(millis: i64) -> String {
    let total_minutes = millis.max(0) / 60_000;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0m");
        assert_eq!(format_elapsed(59_999), "0m");
        assert_eq!(format_elapsed(5 * 60_000), "5m");
        assert_eq!(format_elapsed(2 * 3_600_000 + 60_000), "2h 1m");
        assert_eq!(format_elapsed(26 * 3_600_000), "1d 2h 0m");
        assert_eq!(format_elapsed(-10), "0m");
    }

    #[test]
    fn test_format_timestamp_invalid() {
        assert_eq!(format_timestamp(i64::MAX), "");
    }
}
