//! Timestamp helpers shared by the codec, the query engine, and the store.
//!
//! Every timestamp docket persists is a local wall-clock time at minute
//! precision, so in-memory values are normalized the same way.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::ValidationError;

/// Persisted timestamp layout (`2024-05-01 09:30`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Persisted due-date layout (`2024-05-01`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Archive filename prefix layout (`20240501_093000`).
pub const ARCHIVE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Current local time truncated to the minute.
#[must_use]
pub fn now_minute() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

/// Drop seconds and sub-second precision.
#[must_use]
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Render a timestamp in the persisted layout.
#[must_use]
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a persisted timestamp; `None` on any mismatch.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Parse a persisted due date; `None` on any mismatch.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Midnight at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Parse a caller-supplied ISO 8601 value into a local naive timestamp.
///
/// Accepts a bare date (`2024-05-01`, midnight), a date and time with `T` or
/// a space separator (seconds and fractions optional), or an RFC 3339 value
/// with an offset, which is converted to local time.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming `field` when nothing matches.
pub fn parse_iso(field: &'static str, raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Ok(start_of_day(date));
    }

    for layout in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Local).naive_local());
    }

    Err(ValidationError::new(
        field,
        format!("'{raw}' is not an ISO 8601 date or timestamp"),
    ))
}

/// Parse a caller-supplied due date; any time component is dropped.
///
/// # Errors
///
/// Returns a [`ValidationError`] for `due_date` when the value is malformed.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    parse_iso("due_date", raw).map(|ts| ts.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_drops_seconds() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_milli_opt(9, 30, 42, 250))
            .unwrap();
        assert_eq!(format_timestamp(truncate_to_minute(ts)), "2024-05-01 09:30");
        assert_eq!(truncate_to_minute(ts).second(), 0);
    }

    #[test]
    fn iso_accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        assert_eq!(parse_iso("x", "2024-05-01T09:30").unwrap(), expected);
        assert_eq!(parse_iso("x", "2024-05-01T09:30:00").unwrap(), expected);
        assert_eq!(parse_iso("x", "2024-05-01 09:30").unwrap(), expected);
        assert_eq!(parse_iso("x", "2024-05-01T09:30:00.000").unwrap(), expected);
        assert_eq!(
            parse_iso("x", "2024-05-01").unwrap(),
            start_of_day(expected.date())
        );
    }

    #[test]
    fn iso_rejects_garbage_with_field_name() {
        let err = parse_iso("created_after", "last tuesday").unwrap_err();
        assert_eq!(err.field, "created_after");
        assert!(err.reason.contains("last tuesday"));
    }

    #[test]
    fn persisted_parsers_are_lenient() {
        assert!(parse_timestamp("not a time").is_none());
        assert!(parse_date("2024-13-45").is_none());
        assert_eq!(
            parse_date(" 2024-02-29 "),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
