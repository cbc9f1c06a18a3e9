//! Bounded queues with offer-or-drop discipline.
//!
//! The governor never blocks on a full queue: `offer` either enqueues or
//! sheds the item and bumps the shared drop counter. This favors scheduler
//! liveness over delivery completeness; no backpressure reaches the tick
//! loop.

use crate::error::OfferError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;

/// Sending side of a bounded FIFO.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    label: &'static str,
    tx: mpsc::Sender<T>,
    dropped: Arc<AtomicU64>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

/// Create a bounded queue and its receiving half. Capacity is at least one.
pub fn bounded<T>(
    label: &'static str,
    capacity: usize,
    dropped: Arc<AtomicU64>,
) -> (BoundedQueue<T>, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        BoundedQueue {
            label,
            tx,
            dropped,
        },
        rx,
    )
}

impl<T> BoundedQueue<T> {
    /// Non-blocking enqueue. A full or closed queue sheds the item.
    pub fn offer(&self, item: T) -> Result<(), OfferError> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(OfferError::Full)
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(OfferError::Closed)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Items shed so far on this queue's drop counter.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Receiver shared by a pool of workers.
///
/// `tokio::sync::mpsc` is single-consumer; the pool serializes `recv` calls
/// behind a mutex and processes items outside the lock.
pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Wrap a receiver for use by multiple workers.
pub fn share<T>(rx: mpsc::Receiver<T>) -> SharedReceiver<T> {
    Arc::new(Mutex::new(rx))
}
