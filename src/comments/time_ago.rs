//! Relative time formatting
//!
//! Coarse "N units ago" strings. There is no month or year bucket: old
//! comments keep counting in weeks.

use chrono::{Local, NaiveDateTime};

pub const JUST_NOW: &str = "just now";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Age of `timestamp` relative to the current local server time
pub fn format_time_ago(timestamp: NaiveDateTime) -> String {
    format_time_ago_at(timestamp, Local::now().naive_local())
}

/// Age of `timestamp` relative to `now`
///
/// Timestamps in the future (clock skew) render as "just now".
pub fn format_time_ago_at(timestamp: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - timestamp).num_seconds();

    let (count, unit) = match seconds {
        s if s < MINUTE => return JUST_NOW.to_string(),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < WEEK => (s / DAY, "day"),
        s => (s / WEEK, "week"),
    };

    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{suffix} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn ago(seconds: i64) -> String {
        format_time_ago_at(now() - Duration::seconds(seconds), now())
    }

    #[test]
    fn test_just_now() {
        assert_eq!(ago(0), "just now");
        assert_eq!(ago(59), "just now");
    }

    #[test]
    fn test_minutes() {
        assert_eq!(ago(60), "1 minute ago");
        assert_eq!(ago(90), "1 minute ago");
        assert_eq!(ago(120), "2 minutes ago");
        assert_eq!(ago(3599), "59 minutes ago");
    }

    #[test]
    fn test_hours() {
        assert_eq!(ago(3600), "1 hour ago");
        assert_eq!(ago(7200), "2 hours ago");
        assert_eq!(ago(86_399), "23 hours ago");
    }

    #[test]
    fn test_days() {
        assert_eq!(ago(86_400), "1 day ago");
        assert_eq!(ago(6 * 86_400), "6 days ago");
    }

    #[test]
    fn test_weeks_never_roll_over() {
        assert_eq!(ago(604_800), "1 week ago");
        assert_eq!(ago(3 * 604_800 + 5), "3 weeks ago");
        assert_eq!(ago(104 * 604_800), "104 weeks ago");
    }

    #[test]
    fn test_sub_second_precision_is_floored() {
        let ts = now() - Duration::milliseconds(59_999);
        assert_eq!(format_time_ago_at(ts, now()), "just now");
    }

    #[test]
    fn test_future_timestamp() {
        let ts = now() + Duration::seconds(300);
        assert_eq!(format_time_ago_at(ts, now()), "just now");
    }
}
