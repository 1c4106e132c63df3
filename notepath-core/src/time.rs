//! Timestamp formatting.

use chrono::{DateTime, Local};

/// Current local time.
pub fn now_local() -> DateTime<Local> {
    Local::now()
}

/// Timestamp used in the archive, e.g. `2019-09-17 Tue 8:16:02.123456`.
pub fn timestamp_for_logging(when: &DateTime<Local>) -> String {
    strip_padding(when.format("%Y-%m-%d %a %H:%M:%S%.6f").to_string())
}

/// Timestamp for people, e.g. `Tuesday 17 September 2019 at 8:16 AM`.
pub fn timestamp_for_journal(when: &DateTime<Local>) -> String {
    strip_padding(when.format("%A %d %B %Y at %I:%M %p").to_string())
}

/// How long ago `seconds` was, e.g. `2 hours ago`, rounded to the largest unit.
pub fn readable_timespan(seconds: f64) -> String {
    const SPANS: [(f64, &str, &str); 6] = [
        (60.0, "second", "seconds"),
        (60.0, "minute", "minutes"),
        (24.0, "hour", "hours"),
        (30.0, "day", "days"),
        (12.0, "month", "months"),
        (f64::INFINITY, "year", "years"),
    ];

    let mut span = seconds.max(0.0);
    for (limit, singular, plural) in SPANS {
        if span < limit {
            let count = span.round() as u64;
            let unit = if count == 1 { singular } else { plural };
            return format!("{} {} ago", count, unit);
        }
        span /= limit;
    }
    String::new()
}

// Drop the leading zero of any field that follows a space.
fn strip_padding(stamp: String) -> String {
    stamp.replace(" 0", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Local> {
        Local.with_ymd_and_hms(2019, 9, 17, 8, 6, 2).unwrap()
    }

    #[test]
    fn test_logging_format() {
        assert_eq!(timestamp_for_logging(&sample()), "2019-09-17 Tue 8:06:02.000000");
    }

    #[test]
    fn test_journal_format() {
        assert_eq!(timestamp_for_journal(&sample()), "Tuesday 17 September 2019 at 8:06 AM");
    }

    #[test]
    fn test_readable_timespan() {
        assert_eq!(readable_timespan(1.0), "1 second ago");
        assert_eq!(readable_timespan(30.0), "30 seconds ago");
        assert_eq!(readable_timespan(2.0 * 3600.0), "2 hours ago");
        assert_eq!(readable_timespan(36.0 * 3600.0), "2 days ago");
        assert_eq!(readable_timespan(400.0 * 86400.0), "1 year ago");
    }

    #[test]
    fn test_now_is_recent() {
        assert!(now_local().timestamp() > 0);
    }
}
