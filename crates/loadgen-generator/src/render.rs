//! Token rendering: substituting a sample's tokens into selected records.

use chrono::{DateTime, Utc};
use loadgen_core::{EventBatch, Replacement, Token};
use rand::Rng;
use uuid::Uuid;

/// Render every event in the batch through the token sequence, in order.
///
/// Tokens are mutated as they render (the counter cursor advances), which
/// is why each work item carries its own independent copy.
pub fn render_batch<R: Rng>(batch: &mut EventBatch, tokens: &mut [Token], rng: &mut R) {
    if tokens.is_empty() {
        return;
    }

    let earliest = batch.earliest;
    let latest = batch.latest;
    for event in batch.events.iter_mut() {
        for token in tokens.iter_mut() {
            *event = render_into(event, token, earliest, latest, rng);
        }
    }
}

/// Replace every occurrence of the token's marker with a fresh value.
///
/// Scans left to right past each substitution, so a replacement value that
/// happens to contain the marker is never re-expanded.
fn render_into<R: Rng>(
    event: &str,
    token: &mut Token,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    rng: &mut R,
) -> String {
    if token.pattern.is_empty() {
        return event.to_string();
    }

    let pattern = token.pattern.clone();
    let mut out = String::with_capacity(event.len());
    let mut rest = event;
    while let Some(pos) = rest.find(&pattern) {
        out.push_str(&rest[..pos]);
        out.push_str(&next_value(token, earliest, latest, rng));
        rest = &rest[pos + pattern.len()..];
    }
    out.push_str(rest);
    out
}

fn next_value<R: Rng>(
    token: &mut Token,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    rng: &mut R,
) -> String {
    match &mut token.replacement {
        Replacement::Static { value } => value.clone(),
        Replacement::Counter { next } => {
            let value = *next;
            *next += 1;
            value.to_string()
        }
        Replacement::RandomInt { min, max } => {
            if min >= max {
                min.to_string()
            } else {
                rng.gen_range(*min..=*max).to_string()
            }
        }
        Replacement::Guid => Uuid::new_v4().to_string(),
        Replacement::Timestamp { format } => {
            random_time_in(earliest, latest, rng).format(format).to_string()
        }
    }
}

/// Uniform timestamp inside `[earliest, latest)`; collapses to `earliest`
/// when the window is empty or inverted.
fn random_time_in<R: Rng>(
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    rng: &mut R,
) -> DateTime<Utc> {
    let start = earliest.timestamp();
    let end = latest.timestamp();
    if start >= end {
        earliest
    } else {
        DateTime::from_timestamp(rng.gen_range(start..end), 0).unwrap_or(earliest)
    }
}
