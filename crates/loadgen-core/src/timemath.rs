//! Relative time offset parsing.
//!
//! Backfill specs and live-window bounds are written as `[sign]<number><unit>`
//! strings, e.g. `-2h`, `+30m`, `90s`. A missing sign means a positive offset.

use crate::error::TimeMathError;
use chrono::Duration;

/// Parse an offset string into a signed duration.
///
/// Supported units: `s` (seconds), `m` (minutes), `h` (hours), `d` (days),
/// `w` (weeks).
pub fn parse_offset(spec: &str) -> Result<Duration, TimeMathError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(TimeMathError::Empty);
    }

    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    let number: i64 = rest[..digits_end]
        .parse()
        .map_err(|_| TimeMathError::Number(spec.to_string()))?;

    let unit = &rest[digits_end..];
    let seconds = match unit {
        "s" => number,
        "m" => number * 60,
        "h" => number * 3_600,
        "d" => number * 86_400,
        "w" => number * 604_800,
        _ => {
            return Err(TimeMathError::Unit {
                offset: spec.to_string(),
                unit: unit.to_string(),
            })
        }
    };

    Ok(Duration::seconds(if negative { -seconds } else { seconds }))
}
