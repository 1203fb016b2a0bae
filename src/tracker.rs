use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// Set of queue names this process has seen.
///
/// Publishing to the discovery set is done by [`Client`](crate::Client);
/// the tracker only answers whether a name is new.
#[derive(Debug, Default)]
pub struct QueueTracker {
    queues: Mutex<BTreeSet<String>>,
}

impl QueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `queue`, returning `true` the first time the name is seen.
    pub fn track(&self, queue: &str) -> bool {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if queues.contains(queue) {
            return false;
        }
        queues.insert(queue.to_string())
    }

    pub fn contains(&self, queue: &str) -> bool {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(queue)
    }

    /// Snapshot of all tracked queues, sorted
    pub fn queues(&self) -> Vec<String> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}
