//! Batch sizing and token rendering for the loadgen framework.
//!
//! Given a work item's budget and the shared candidate pool, `sizing`
//! selects an ordered batch of raw records; `render` then substitutes the
//! item's token copy (counters, timestamps, random values) into each
//! record. Both are pure with respect to the queues: the framework crate
//! owns dispatch and delivery.

pub mod render;
pub mod sizing;

pub use render::render_batch;
pub use sizing::{count_batch, size_batch, SizingError};
