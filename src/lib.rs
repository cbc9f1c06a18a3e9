//! Synthetic event load generator.
//!
//! Continuously produces synthetic data records for each configured sample
//! at a governed rate, optionally back-filling a historical window before
//! live generation, and dispatches generation work to a worker pool
//! through bounded queues until a time- or count-based end condition is
//! reached. Used to drive load against a downstream ingestion system.

pub mod app;

pub use loadgen_core::{LoadSchema, SampleSpec};
pub use loadgen_framework::{MetricsSnapshot, RuntimeConfig};
