//! Dispatched units of generation work.

use crate::queue::BoundedQueue;
use chrono::{DateTime, Utc};
use loadgen_core::{CandidatePool, EventBatch, GenerationMode, SizingPolicy, Token};
use std::sync::Arc;

/// Queue of work items between the governors and the generator workers.
pub type DispatchQueue = BoundedQueue<WorkItem>;

/// Queue of finished batches between the workers and the output stage.
pub type ResultQueue = BoundedQueue<EventBatch>;

/// A snapshot of one unit of generation work.
///
/// The token sequence is an independent deep copy: mutating it inside a
/// worker never affects the source sample or any sibling item. The
/// candidate pool is shared immutably.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Name of the sample this item was produced for.
    pub sample: String,

    /// Round budget: records in `count` mode, bytes in `volume` mode.
    pub budget: i64,

    /// Start of the time window to generate into.
    pub earliest: DateTime<Utc>,

    /// End of the time window (exclusive).
    pub latest: DateTime<Utc>,

    /// Sizing policy resolved at governor construction.
    pub policy: SizingPolicy,

    /// Whether `budget` counts records or bytes.
    pub mode: GenerationMode,

    /// Independent copy of the sample's token sequence.
    pub tokens: Vec<Token>,

    /// Shared immutable candidate pool.
    pub pool: Arc<CandidatePool>,

    /// Result boundary the produced batch is offered to.
    pub results: ResultQueue,
}
