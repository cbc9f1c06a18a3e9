//! Scheduling governor, bounded queues, and worker pool for loadgen.
//!
//! One `TimerGovernor` runs per sample, fanning work items out to a shared
//! pool of `GeneratorWorker`s through a bounded dispatch queue; finished
//! batches flow through a bounded result queue to the `OutputWorker`.
//! Queue discipline everywhere is non-blocking offer-or-drop: a full queue
//! sheds load instead of stalling the schedulers.
//!
//! ```text
//! TimerGovernor (per sample)
//!        │  WorkItem
//!        ▼
//! DispatchQueue ──► GeneratorWorker pool ──► ResultQueue ──► OutputWorker
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod rate;
pub mod registry;
pub mod sink;
pub mod stop;
pub mod timer;
pub mod work;
pub mod worker;

pub use config::RuntimeConfig;
pub use error::{ConstructionError, OfferError};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use queue::{bounded, share, BoundedQueue, SharedReceiver};
pub use rate::{ConstantRate, PerturbedRate, RateSource};
pub use registry::PluginRegistry;
pub use sink::{DevNullSink, FileSink, OutputSink, OutputWorker, StdoutSink};
pub use stop::StopSignal;
pub use timer::{EndCondition, TimerGovernor};
pub use work::{DispatchQueue, ResultQueue, WorkItem};
pub use worker::GeneratorWorker;
