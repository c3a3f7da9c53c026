use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};

/// Parse a duration such as `24h`, `5m`, `1h30m` or `1.5h`.
///
/// Accepts a sequence of decimal numbers each followed by a unit: `ns`,
/// `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is also accepted.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || Error::Argument(format!("invalid duration '{}'", input));

    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(Duration::zero());
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;

    while !rest.is_empty() {
        let number_len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map_or(rest.len(), |(i, _)| i);
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map_or(rest.len(), |(i, _)| i);
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(invalid());
    }

    Ok(Duration::nanoseconds(total_nanos.round() as i64))
}

/// Start of a lookup window reaching `since` back from `now`.
pub fn start_time(now: DateTime<Utc>, since: Duration) -> DateTime<Utc> {
    now - since
}

/// Format a timestamp for display
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
