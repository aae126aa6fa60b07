use chrono::{DateTime, Utc};

/// Returns the current UTC time as an RFC 9557 / RFC 3339 string with
/// millisecond precision, e.g. `2024-05-01T12:00:00.123Z`.
pub fn current_datetime_rfc9557() -> String {
    let now: DateTime<Utc> = Utc::now();
    format_rfc9557(&now)
}

/// Formats an arbitrary UTC timestamp the same way as [`current_datetime_rfc9557`].
pub fn format_rfc9557(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
