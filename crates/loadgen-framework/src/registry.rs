//! Plugin registry.
//!
//! Maps capability names from the configuration to constructors, resolved
//! once at governor/app construction. Covers the three pluggable
//! capabilities: rate sources, sizing policies, and output sinks.

use crate::error::ConstructionError;
use crate::rate::{ConstantRate, PerturbedRate, RateSource};
use crate::sink::{DevNullSink, FileSink, OutputSink, StdoutSink};
use loadgen_core::{OutputSpec, RaterSpec, SizingPolicy};
use std::collections::HashMap;

type RaterFactory = Box<dyn Fn(&RaterSpec) -> Box<dyn RateSource + Send> + Send + Sync>;
type SinkFactory =
    Box<dyn Fn(&OutputSpec) -> Result<Box<dyn OutputSink + Send>, ConstructionError> + Send + Sync>;

/// Name-to-constructor registry for the pluggable capabilities.
pub struct PluginRegistry {
    raters: HashMap<String, RaterFactory>,
    sinks: HashMap<String, SinkFactory>,
    policies: HashMap<String, SizingPolicy>,
}

impl PluginRegistry {
    /// Empty registry with no capabilities registered.
    pub fn empty() -> Self {
        Self {
            raters: HashMap::new(),
            sinks: HashMap::new(),
            policies: HashMap::new(),
        }
    }

    /// Registry seeded with the built-in plugins.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register_rater("constant", |spec| Box::new(ConstantRate::new(spec.count)));
        registry.register_rater("perturbed", |spec| {
            Box::new(PerturbedRate::new(spec.count, spec.spread))
        });

        registry.register_sink("devnull", |_| Ok(Box::new(DevNullSink::new())));
        registry.register_sink("stdout", |_| Ok(Box::new(StdoutSink::new())));
        registry.register_sink("file", |spec| {
            let path = spec.path.clone().ok_or(ConstructionError::MissingParam {
                name: "file".to_string(),
                param: "path",
            })?;
            Ok(Box::new(FileSink::new(path)))
        });

        registry.register_policy("sequential", SizingPolicy::Sequential);
        registry.register_policy("random", SizingPolicy::Random);
        registry.register_policy("bundle", SizingPolicy::Bundle);

        registry
    }

    pub fn register_rater<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&RaterSpec) -> Box<dyn RateSource + Send> + Send + Sync + 'static,
    {
        self.raters.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_sink<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&OutputSpec) -> Result<Box<dyn OutputSink + Send>, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        self.sinks.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_policy(&mut self, name: &str, policy: SizingPolicy) {
        self.policies.insert(name.to_string(), policy);
    }

    /// Construct the rate source named by a rater spec.
    pub fn rater(&self, spec: &RaterSpec) -> Result<Box<dyn RateSource + Send>, ConstructionError> {
        let factory = self
            .raters
            .get(&spec.name)
            .ok_or_else(|| ConstructionError::UnknownPlugin {
                kind: "rater",
                name: spec.name.clone(),
            })?;
        Ok(factory(spec))
    }

    /// Construct the sink named by an output spec.
    pub fn sink(&self, spec: &OutputSpec) -> Result<Box<dyn OutputSink + Send>, ConstructionError> {
        let factory = self
            .sinks
            .get(&spec.name)
            .ok_or_else(|| ConstructionError::UnknownPlugin {
                kind: "sink",
                name: spec.name.clone(),
            })?;
        factory(spec)
    }

    /// Resolve a sizing policy name.
    pub fn policy(&self, name: &str) -> Result<SizingPolicy, ConstructionError> {
        self.policies
            .get(name)
            .copied()
            .ok_or_else(|| ConstructionError::UnknownPlugin {
                kind: "sizing policy",
                name: name.to_string(),
            })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
