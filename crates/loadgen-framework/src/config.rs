//! Runtime configuration for a generation run.

use std::time::Duration;

/// Knobs that apply to the whole run rather than to one sample.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the dispatch queue between governors and workers.
    pub dispatch_capacity: usize,
    /// Capacity of the result queue between workers and the output stage.
    pub result_capacity: usize,
    /// Size of the generator worker pool.
    pub generator_workers: usize,
    /// Tick granularity of every governor's scheduling loop.
    pub granularity: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_capacity: 512,
            result_capacity: 512,
            generator_workers: 4,
            granularity: Duration::from_secs(1),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity;
        self
    }

    pub fn with_generator_workers(mut self, workers: usize) -> Self {
        self.generator_workers = workers;
        self
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }
}
