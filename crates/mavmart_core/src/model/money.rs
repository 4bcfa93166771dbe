//! Minor-unit money helpers.
//!
//! Prices are stored as integer cents; these helpers convert to and from the
//! dollar text shown in forms without going through floating point.

use once_cell::sync::Lazy;
use regex::Regex;

static DOLLARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?(?P<whole>[0-9]+)(?:\.(?P<fraction>[0-9]{1,2}))?$")
        .expect("valid dollars regex")
});

/// Renders cents as `$D.CC`, e.g. `1234` -> `$12.34`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!("{sign}${}.{:02}", magnitude / 100, magnitude % 100)
}

/// Parses form input such as `12`, `12.3`, `12.34` or `$12.34` into cents.
///
/// Returns `None` for anything else, including more than two fraction digits
/// and values that overflow `i64`.
pub fn parse_dollars(input: &str) -> Option<i64> {
    let caps = DOLLARS_RE.captures(input.trim())?;
    let whole: i64 = caps.name("whole")?.as_str().parse().ok()?;
    let fraction = match caps.name("fraction").map(|m| m.as_str()) {
        None => 0,
        Some(digits) if digits.len() == 1 => digits.parse::<i64>().ok()? * 10,
        Some(digits) => digits.parse::<i64>().ok()?,
    };
    whole.checked_mul(100)?.checked_add(fraction)
}
