//! Output sinks and the worker that drains the result queue.

use crate::metrics::RunMetrics;
use anyhow::Result;
use async_trait::async_trait;
use loadgen_core::EventBatch;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Transport for finished batches. One sink instance per sample.
#[async_trait]
pub trait OutputSink: Send {
    async fn write_batch(&mut self, batch: &EventBatch) -> Result<()>;
}

/// Discards batches, keeping only counts. The default sink.
#[derive(Debug, Default)]
pub struct DevNullSink {
    batches: u64,
    events: u64,
}

impl DevNullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn events(&self) -> u64 {
        self.events
    }
}

#[async_trait]
impl OutputSink for DevNullSink {
    async fn write_batch(&mut self, batch: &EventBatch) -> Result<()> {
        self.batches += 1;
        self.events += batch.len() as u64;
        Ok(())
    }
}

/// Writes one line per event to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    async fn write_batch(&mut self, batch: &EventBatch) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        for event in &batch.events {
            stdout.write_all(event.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        Ok(())
    }
}

/// Appends one line per event to a file, opened lazily.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write_batch(&mut self, batch: &EventBatch) -> Result<()> {
        if self.file.is_none() {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            self.file = Some(file);
        }
        if let Some(file) = self.file.as_mut() {
            for event in &batch.events {
                file.write_all(event.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
        }
        Ok(())
    }
}

/// Drains the result queue, routing each batch to its sample's sink.
///
/// Sink write failures are logged and the drain continues; the output
/// stage never stalls the rest of the pipeline.
pub struct OutputWorker {
    rx: mpsc::Receiver<EventBatch>,
    sinks: HashMap<String, Box<dyn OutputSink + Send>>,
    metrics: RunMetrics,
}

impl OutputWorker {
    pub fn new(
        rx: mpsc::Receiver<EventBatch>,
        sinks: HashMap<String, Box<dyn OutputSink + Send>>,
        metrics: RunMetrics,
    ) -> Self {
        Self { rx, sinks, metrics }
    }

    /// Run until the result queue closes.
    pub async fn run(mut self) {
        while let Some(batch) = self.rx.recv().await {
            let Some(sink) = self.sinks.get_mut(&batch.sample) else {
                warn!(sample = %batch.sample, "no sink configured for sample, discarding batch");
                continue;
            };
            let events = batch.len() as u64;
            let bytes = batch.byte_size() as u64;
            match sink.write_batch(&batch).await {
                Ok(()) => self.metrics.add_batch(events, bytes),
                Err(err) => {
                    warn!(sample = %batch.sample, error = %err, "sink write failed, discarding batch");
                }
            }
        }
        debug!("result queue closed, output worker exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn batch(sample: &str, events: &[&str]) -> EventBatch {
        let now = Utc::now();
        let mut batch = EventBatch::new(sample, now, now);
        for event in events {
            batch.push(event.to_string());
        }
        batch
    }

    #[tokio::test]
    async fn test_devnull_counts() {
        let mut sink = DevNullSink::new();
        sink.write_batch(&batch("s", &["a", "b"])).await.unwrap();
        sink.write_batch(&batch("s", &["c"])).await.unwrap();
        assert_eq!(sink.batches(), 2);
        assert_eq!(sink.events(), 3);
    }

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut sink = FileSink::new(path.clone());
        sink.write_batch(&batch("s", &["one", "two"])).await.unwrap();
        sink.write_batch(&batch("s", &["three"])).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn test_output_worker_routes_and_counts() {
        let metrics = RunMetrics::new();
        let (tx, rx) = mpsc::channel(8);

        let mut sinks: HashMap<String, Box<dyn OutputSink + Send>> = HashMap::new();
        sinks.insert("known".to_string(), Box::new(DevNullSink::new()));

        let worker = OutputWorker::new(rx, sinks, metrics.clone());
        let handle = tokio::spawn(worker.run());

        tx.send(batch("known", &["a", "b"])).await.unwrap();
        tx.send(batch("unknown", &["c"])).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.batches_written, 1);
        assert_eq!(snap.events_written, 2);
    }
}
