//! Local calendar date primitives.
//!
//! Every place that compares dates goes through this module. A bare
//! `YYYY-MM-DD` string is a calendar day in the user's local zone and is
//! never shifted; a full timestamp carrying an offset is converted into
//! local wall-clock time; a timestamp without an offset is taken as local
//! wall-clock time as written.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Date-only wire format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day wire format used by medication `times` and activity `time`.
pub const TIME_FORMAT: &str = "%H:%M";

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a date string as a local calendar day.
///
/// Returns `None` when the input is neither a date nor a timestamp.
pub fn parse_local_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 10 {
        return NaiveDate::parse_from_str(raw, DATE_FORMAT).ok();
    }
    parse_local_datetime(raw).map(|dt| dt.date())
}

/// Parse a date or timestamp as local wall-clock time.
///
/// A date-only string resolves to local midnight.
pub fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.len() == 10 {
        return NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse a local calendar day, defaulting to the day of `now` when the
/// input is malformed.
pub fn local_date_or_today(raw: &str, now: NaiveDateTime) -> NaiveDate {
    parse_local_date(raw).unwrap_or_else(|| {
        tracing::debug!(value = raw, "Malformed date, using today");
        now.date()
    })
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day, truncated to the minute.
///
/// Occurrence ids and reminder keys carry `HH:MM` only, so seconds are
/// dropped here.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    let time = NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()?;
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
}

/// Canonical `YYYY-MM-DD` key for a day.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Canonical `HH:MM` key for a time of day.
pub fn time_key(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Format a local wall-clock instant as an ISO timestamp with offset.
///
/// Falls back to the naive form when the local time does not exist
/// (DST gap).
pub fn to_iso_timestamp(local: NaiveDateTime) -> String {
    match local.and_local_timezone(Local) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => dt.to_rfc3339(),
        chrono::LocalResult::None => local.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_only_string_is_not_shifted() {
        assert_eq!(parse_local_date("2026-03-01"), Some(ymd(2026, 3, 1)));
        assert_eq!(parse_local_date(" 2026-12-31 "), Some(ymd(2026, 12, 31)));
    }

    #[test]
    fn naive_timestamp_keeps_wall_clock() {
        let dt = parse_local_datetime("2026-03-01T23:30:00").unwrap();
        assert_eq!(dt.date(), ymd(2026, 3, 1));
        assert_eq!(time_key(dt.time()), "23:30");
        assert_eq!(parse_local_date("2026-03-01T23:30"), Some(ymd(2026, 3, 1)));
    }

    #[test]
    fn offset_timestamp_converts_to_local() {
        let raw = "2026-03-01T12:00:00Z";
        let expected = DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(parse_local_datetime(raw), Some(expected));
    }

    #[test]
    fn date_only_datetime_is_local_midnight() {
        let dt = parse_local_datetime("2026-05-10").unwrap();
        assert_eq!(dt, ymd(2026, 5, 10).and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn malformed_dates_default_to_today() {
        let now = ymd(2026, 4, 2).and_hms_opt(9, 15, 0).unwrap();
        assert_eq!(parse_local_date("not a date"), None);
        assert_eq!(local_date_or_today("2026-13-45", now), ymd(2026, 4, 2));
        assert_eq!(local_date_or_today("", now), ymd(2026, 4, 2));
    }

    #[test]
    fn time_of_day_parsing() {
        assert_eq!(
            parse_time_of_day("08:00"),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(
            parse_time_of_day("20:15:30"),
            NaiveTime::from_hms_opt(20, 15, 0)
        );
        assert_eq!(parse_time_of_day("8pm"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn keys_are_zero_padded() {
        assert_eq!(date_key(ymd(2026, 1, 5)), "2026-01-05");
        assert_eq!(time_key(NaiveTime::from_hms_opt(7, 5, 0).unwrap()), "07:05");
    }
}
