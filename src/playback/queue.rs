//! 待播工作队列。

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::debug;

use crate::playback::types::WorkItem;

/// Ordered, concurrency-safe container of pending work items. Callers
/// enqueue from arbitrary threads; the orchestration loop dequeues and
/// clears. The queue owns the side effect of discarding temporary backing
/// files when items are purged unplayed.
#[derive(Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail. Never blocks, never fails.
    pub fn enqueue(&self, item: WorkItem) {
        self.items.lock().push_back(item);
    }

    /// Removes and returns the head, non-blocking.
    pub fn try_dequeue(&self) -> Option<WorkItem> {
        self.items.lock().pop_front()
    }

    /// Best-effort snapshot under concurrent access.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Removes all pending items, discarding the backing file of every
    /// temporary one. Returns the number of purged items.
    pub fn clear(&self) -> usize {
        let drained: Vec<WorkItem> = self.items.lock().drain(..).collect();
        let purged = drained.len();

        for item in &drained {
            item.discard_backing();
        }

        if purged > 0 {
            debug!(target: "playback_queue", purged, "cleared pending queue");
        }

        purged
    }
}
