//! Permissive timestamp parsing and XES timestamp rendering

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Parse a timestamp string to `DateTime<FixedOffset>`, trying multiple formats.
///
/// Values without timezone information are interpreted as UTC.
///
/// # Supported Formats (in order of precedence)
/// 1. Custom format (if provided) - tries both with timezone and as naive (assumes UTC)
/// 2. RFC3339: `2023-10-06T09:30:21+00:00`
/// 3. ISO 8601 with offset (no colon): `2023-10-06T09:30:21+0000`
/// 4. RFC2822: `Fri, 06 Oct 2023 09:30:21 +0000`
/// 5. Naive datetime with fractional seconds: `2023-10-06 09:30:21.890421`
/// 6. Naive ISO 8601 (optionally fractional): `2023-10-06T09:30:21.348555`
/// 7. Naive with UTC suffix: `2023-10-06 09:30:21 UTC`
/// 8. Slashed: `2023/10/06 09:30:21`
/// 9. Dotted day-first: `06.10.2023 09:30:21` or `06.10.2023 09:30`
/// 10. GMT format: `Mon Apr 03 2023 12:08:18 GMT+0200 (...)` (timezone part parsed)
/// 11. Bare date: `2023-10-06` (midnight)
pub fn parse_timestamp(time: &str, custom_format: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let time = time.trim();
    if let Some(date_format) = custom_format {
        if let Ok(dt) = DateTime::parse_from_str(time, date_format) {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(time, date_format) {
            return Some(dt.and_utc().into());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(time) {
        return Some(dt);
    }

    for naive_format in [
        "%F %T%.f",
        "%FT%T%.f",
        "%F %T UTC",
        "%Y/%m/%d %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(time, naive_format) {
            return Some(dt.and_utc().into());
        }
    }

    // JavaScript Date.toString(): "Mon Apr 03 2023 12:08:18 GMT+0200 (Central European Summer Time)"
    // The weekday and the trailing timezone name are ignored
    if let Ok((dt, _)) = DateTime::parse_and_remainder(time, "%a %b %d %Y %T GMT%z") {
        return Some(dt);
    }

    if let Ok(d) = NaiveDate::parse_from_str(time, "%F") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().into());
    }
    None
}

/// Render a timestamp the way XES expects it
///
/// Always millisecond precision (truncated), followed by `Z` for a zero offset or by a signed
/// `HH:MM` offset otherwise (e.g., `2017-03-01T10:20:30.450+01:00`).
pub fn format_xes_timestamp(dt: &DateTime<FixedOffset>) -> String {
    let base = dt.format("%Y-%m-%dT%H:%M:%S%.3f");
    let offset = dt.offset().local_minus_utc();
    if offset == 0 {
        return format!("{base}Z");
    }
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;
    format!("{base}{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}
