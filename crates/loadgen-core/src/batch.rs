//! Finished event batches.

use chrono::{DateTime, Utc};

/// Ordered sequence of records produced for one work item.
///
/// Created by the sizing algorithm and handed across the output boundary;
/// ownership transfers to the output stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    /// Name of the sample the batch was generated for.
    pub sample: String,

    /// Start of the time window the batch covers.
    pub earliest: DateTime<Utc>,

    /// End of the time window the batch covers (exclusive).
    pub latest: DateTime<Utc>,

    /// Rendered records, in selection order.
    pub events: Vec<String>,
}

impl EventBatch {
    /// Create an empty batch for a sample and window.
    pub fn new(
        sample: impl Into<String>,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    ) -> Self {
        Self {
            sample: sample.into(),
            earliest,
            latest,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: String) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total byte length of all records in the batch.
    pub fn byte_size(&self) -> usize {
        self.events.iter().map(String::len).sum()
    }
}
