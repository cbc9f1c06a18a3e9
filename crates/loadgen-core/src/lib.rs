//! Core types for the loadgen synthetic event generator.
//!
//! This crate defines the configuration schema (YAML), the runtime sample
//! state (candidate pool, token sequence, time windows), relative-time
//! parsing, and the event batch type shared across the workspace. The
//! scheduling governor and worker pool live in `loadgen-framework`; batch
//! sizing and token rendering live in `loadgen-generator`.

pub mod batch;
pub mod error;
pub mod sample;
pub mod schema;
pub mod timemath;
pub mod token;

pub use batch::EventBatch;
pub use error::{LoadError, SampleError, SchemaError, TimeMathError};
pub use sample::{CandidatePool, CandidateRecord, Sample};
pub use schema::{
    GenerationMode, LoadSchema, OutputSpec, RaterSpec, SampleSpec, SizingPolicy,
};
pub use timemath::parse_offset;
pub use token::{Replacement, Token};
