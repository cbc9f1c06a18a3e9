//! Generator workers: the pool consuming dispatched work items.

use crate::queue::SharedReceiver;
use crate::work::WorkItem;
use loadgen_core::GenerationMode;
use loadgen_generator::{count_batch, render_batch, size_batch};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// One worker in the generation pool.
///
/// Workers share the dispatch receiver; each item is sized, rendered
/// through the item's own token copy, and offered to the result queue.
pub struct GeneratorWorker {
    id: usize,
    rx: SharedReceiver<WorkItem>,
}

impl GeneratorWorker {
    pub fn new(id: usize, rx: SharedReceiver<WorkItem>) -> Self {
        Self { id, rx }
    }

    /// Run until the dispatch queue closes.
    pub async fn run(self) {
        let mut rng = StdRng::from_entropy();
        info!(worker = self.id, "generator worker started");

        loop {
            let item = { self.rx.lock().await.recv().await };
            let Some(mut item) = item else {
                break;
            };
            self.process(&mut item, &mut rng);
        }

        debug!(worker = self.id, "dispatch queue closed, generator worker exiting");
    }

    fn process(&self, item: &mut WorkItem, rng: &mut StdRng) {
        let mut batch = match item.mode {
            GenerationMode::Volume => {
                match size_batch(
                    item.policy,
                    &item.sample,
                    item.earliest,
                    item.latest,
                    item.budget,
                    &item.pool,
                    rng,
                ) {
                    Ok(batch) => batch,
                    Err(err) => {
                        warn!(
                            worker = self.id,
                            sample = %item.sample,
                            error = %err,
                            "sizing failed, dropping work item"
                        );
                        return;
                    }
                }
            }
            GenerationMode::Count => {
                count_batch(&item.sample, item.earliest, item.latest, item.budget, &item.pool)
            }
        };

        if batch.is_empty() {
            debug!(worker = self.id, sample = %item.sample, "empty batch, nothing to output");
            return;
        }

        render_batch(&mut batch, &mut item.tokens, rng);

        if let Err(err) = item.results.offer(batch) {
            warn!(
                worker = self.id,
                sample = %item.sample,
                error = %err,
                "failed to enqueue batch, dropping"
            );
        }
    }
}
