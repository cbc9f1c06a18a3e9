//! Cooperative stop signalling.
//!
//! Two levels: a global flag shared by every governor and a local flag per
//! governor. Both are single-boolean atomics; governors read them once per
//! tick, so an in-flight round always completes before a stop is honored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Paired global/local stop flags for one governor.
#[derive(Debug, Clone)]
pub struct StopSignal {
    global: Arc<AtomicBool>,
    local: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create a signal bound to a shared global flag, with a fresh local flag.
    pub fn new(global: Arc<AtomicBool>) -> Self {
        Self {
            global,
            local: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal with its own private global flag, for tests and standalone runs.
    pub fn standalone() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)))
    }

    /// Request a stop of this governor only.
    pub fn stop_local(&self) {
        self.local.store(true, Ordering::SeqCst);
    }

    /// True once either level has requested a stop.
    pub fn is_stopped(&self) -> bool {
        self.global.load(Ordering::SeqCst) || self.local.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_stop_does_not_touch_global() {
        let global = Arc::new(AtomicBool::new(false));
        let a = StopSignal::new(Arc::clone(&global));
        let b = StopSignal::new(Arc::clone(&global));

        a.stop_local();
        assert!(a.is_stopped());
        assert!(!b.is_stopped());

        global.store(true, Ordering::SeqCst);
        assert!(b.is_stopped());
    }
}
