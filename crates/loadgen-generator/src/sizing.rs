//! Batch sizing: turning a round budget into an ordered selection of records.
//!
//! The byte-budget variant approximates the budget without materially
//! exceeding it, under one of three policies. The record-count variant is a
//! plain cyclic fill.

use chrono::{DateTime, Utc};
use loadgen_core::{CandidatePool, EventBatch, SizingPolicy};
use rand::Rng;
use thiserror::Error;
use tracing::warn;

/// Error type for sizing operations.
#[derive(Debug, Error)]
pub enum SizingError {
    /// The budget cannot fit even one record; reported rather than
    /// silently substituted with a malformed batch.
    #[error(
        "Budget of {budget} bytes cannot fit one record of {record} bytes for sample '{sample}'"
    )]
    Unsatisfiable {
        sample: String,
        budget: i64,
        record: usize,
    },
}

/// Select records approximating `budget` bytes from `pool`.
///
/// A non-positive budget or an empty pool yields an empty batch; the
/// latter is logged since it usually means a sample failed to load.
pub fn size_batch<R: Rng>(
    policy: SizingPolicy,
    sample: &str,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    budget: i64,
    pool: &CandidatePool,
    rng: &mut R,
) -> Result<EventBatch, SizingError> {
    let mut batch = EventBatch::new(sample, earliest, latest);

    if budget <= 0 {
        return Ok(batch);
    }
    if pool.is_empty() {
        warn!(sample, "candidate pool is empty, emitting empty batch");
        return Ok(batch);
    }

    match policy {
        SizingPolicy::Random => fill_random(&mut batch, budget, pool, rng),
        SizingPolicy::Bundle => fill_bundle(&mut batch, budget, pool),
        SizingPolicy::Sequential => fill_sequential(&mut batch, sample, budget, pool)?,
    }

    Ok(batch)
}

/// Uniform random draws with replacement until the budget is met.
fn fill_random<R: Rng>(batch: &mut EventBatch, budget: i64, pool: &CandidatePool, rng: &mut R) {
    let records = pool.records();
    let mut accumulated = 0i64;
    while accumulated < budget {
        let record = &records[rng.gen_range(0..records.len())];
        batch.push(record.raw.clone());
        accumulated += record.bytes as i64;
    }
}

/// Whole-pool copies, in order, until the budget is exceeded. Overshoot is
/// bounded by one full pool's total length.
fn fill_bundle(batch: &mut EventBatch, budget: i64, pool: &CandidatePool) {
    let pass = pool.total_bytes() as i64;
    let mut accumulated = 0i64;
    while accumulated <= budget {
        for record in pool.records() {
            batch.push(record.raw.clone());
        }
        accumulated += pass;
    }
}

/// Cyclic in-order fill from index zero. A candidate is admitted while it
/// fits the remaining budget, with a 10% overshoot tolerance on the last
/// admitted item; the first rejection ends the fill.
fn fill_sequential(
    batch: &mut EventBatch,
    sample: &str,
    budget: i64,
    pool: &CandidatePool,
) -> Result<(), SizingError> {
    let records = pool.records();
    let mut line = 0usize;
    let mut accumulated = 0i64;

    loop {
        let record = &records[line % records.len()];
        let length = record.bytes as i64;

        if line == 0 && length > budget {
            return Err(SizingError::Unsatisfiable {
                sample: sample.to_string(),
                budget,
                record: record.bytes,
            });
        }

        let remaining = budget - accumulated;
        if length <= remaining || (length as f64) * 0.9 <= remaining as f64 {
            batch.push(record.raw.clone());
            accumulated += length;
            line += 1;
        } else {
            break;
        }
    }

    Ok(())
}

/// Record-count sizing: take `count` records cycling the pool from the
/// start. Used when a sample's budget counts records rather than bytes.
pub fn count_batch(
    sample: &str,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
    count: i64,
    pool: &CandidatePool,
) -> EventBatch {
    let mut batch = EventBatch::new(sample, earliest, latest);

    if count <= 0 {
        return batch;
    }
    if pool.is_empty() {
        warn!(sample, "candidate pool is empty, emitting empty batch");
        return batch;
    }

    let records = pool.records();
    for i in 0..count as usize {
        batch.push(records[i % records.len()].raw.clone());
    }
    batch
}
