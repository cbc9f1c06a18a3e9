//! Error types for the scheduling framework.

use loadgen_core::{SampleError, TimeMathError};
use thiserror::Error;

/// Errors that prevent a governor or sink from being constructed.
///
/// These surface before the governor starts; a governor that constructed
/// successfully is only ever ended by a stop condition.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// Capability name not present in the plugin registry
    #[error("Unknown {kind} plugin '{name}'")]
    UnknownPlugin { kind: &'static str, name: String },

    /// A sink was selected without a required parameter
    #[error("Sink '{name}' requires parameter '{param}'")]
    MissingParam { name: String, param: &'static str },

    /// Malformed end-condition timestamp
    #[error("Sample '{sample}': invalid end timestamp '{value}': {reason}")]
    EndCondition {
        sample: String,
        value: String,
        reason: String,
    },

    /// Malformed backfill spec
    #[error("Sample '{sample}': invalid backfill spec '{value}': {source}")]
    Backfill {
        sample: String,
        value: String,
        #[source]
        source: TimeMathError,
    },

    /// Sample-level construction failure (bad window offsets)
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Outcome of a non-blocking enqueue onto a bounded queue.
///
/// Both variants shed the offered item; neither blocks the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfferError {
    /// Queue at capacity
    #[error("queue full")]
    Full,

    /// Receiver side has gone away
    #[error("queue closed")]
    Closed,
}
