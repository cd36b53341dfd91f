//! Millisecond timestamps and local calendar helpers.
use chrono::{DateTime, Duration, Local, TimeZone, Utc};

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns `[start, end]` of the local calendar day containing `now`, in ms.
/// `end` is the last millisecond of the day.
pub fn local_day_bounds(now: i64) -> (i64, i64) {
    let local = match Local.timestamp_millis_opt(now).earliest() {
        Some(t) => t,
        None => return (now, now),
    };
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match midnight {
        Some(start) => {
            let end = start + Duration::days(1) - Duration::milliseconds(1);
            (start.timestamp_millis(), end.timestamp_millis())
        }
        None => (now, now),
    }
}

/// Formats a timestamp as local `YYYY-MM-DD HH:MM`, or "never" for 0.
pub fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    match Utc.timestamp_millis_opt(millis).single() {
        Some(utc) => {
            let datetime: DateTime<Local> = utc.into();
            datetime.format("%Y-%m-%d %H:%M").to_string()
        }
        None => "invalid date".to_string(),
    }
}
