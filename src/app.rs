//! Run wiring: governors, worker pool, and the output stage.

use anyhow::{Context, Result};
use loadgen_core::LoadSchema;
use loadgen_framework::{
    bounded, share, GeneratorWorker, MetricsSnapshot, OutputSink, OutputWorker, PluginRegistry,
    RunMetrics, RuntimeConfig, StopSignal, TimerGovernor,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Construct every component for a schema and run to completion.
///
/// Returns the final metrics snapshot once every governor has stopped and
/// the queues have drained.
pub async fn run(
    schema: LoadSchema,
    runtime: RuntimeConfig,
    global_stop: Arc<AtomicBool>,
) -> Result<MetricsSnapshot> {
    let registry = PluginRegistry::with_defaults();
    let metrics = RunMetrics::new();

    let (dispatch, dispatch_rx) = bounded("dispatch", runtime.dispatch_capacity, metrics.dropped_handle());
    let (results, results_rx) = bounded("results", runtime.result_capacity, metrics.dropped_handle());

    // One sink per sample, routed by batch sample name.
    let mut sinks: HashMap<String, Box<dyn OutputSink + Send>> = HashMap::new();
    for sample in &schema.samples {
        let sink = registry
            .sink(&sample.output)
            .with_context(|| format!("Failed to construct sink for sample '{}'", sample.name))?;
        sinks.insert(sample.name.clone(), sink);
    }
    let output = tokio::spawn(OutputWorker::new(results_rx, sinks, metrics.clone()).run());

    let shared_rx = share(dispatch_rx);
    let mut workers = Vec::with_capacity(runtime.generator_workers);
    for id in 0..runtime.generator_workers {
        workers.push(tokio::spawn(
            GeneratorWorker::new(id, Arc::clone(&shared_rx)).run(),
        ));
    }

    // Governors are constructed before any is started so a bad sample
    // definition fails the whole run up front.
    let mut governors = Vec::with_capacity(schema.samples.len());
    for sample in schema.samples {
        let name = sample.name.clone();
        let governor = TimerGovernor::new(
            sample,
            &registry,
            dispatch.clone(),
            results.clone(),
            StopSignal::new(Arc::clone(&global_stop)),
            metrics.clone(),
            runtime.granularity,
        )
        .with_context(|| format!("Failed to construct governor for sample '{name}'"))?;
        governors.push(governor);
    }

    info!(governors = governors.len(), workers = runtime.generator_workers, "run starting");

    let mut handles = Vec::with_capacity(governors.len());
    for governor in governors {
        handles.push(tokio::spawn(governor.start()));
    }
    for handle in handles {
        handle.await.context("governor task panicked")?;
    }

    // Closing the dispatch queue lets the worker pool drain and exit;
    // closing the result queue then releases the output stage.
    drop(dispatch);
    for handle in workers {
        handle.await.context("generator worker panicked")?;
    }
    drop(results);
    output.await.context("output worker panicked")?;

    info!("run complete");
    Ok(metrics.snapshot())
}
