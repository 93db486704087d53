//! 单槽异步唤醒原语。

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Outcome of a wake-signal wait. Cancellation is an ordinary result at
/// this suspension point, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Woken,
    Cancelled,
}

/// Single-slot, edge-triggered wake signal.
///
/// A raise with no waiter present is remembered and satisfies the next
/// wait; redundant raises with no intervening wait collapse into one
/// pending wake. At most one waiter is released per raise. This lets the
/// orchestration loop sleep when idle without ever losing the race
/// between "queue just got an item" and "loop just found it empty".
#[derive(Default)]
pub struct WakeSignal {
    notify: Notify,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        // notify_one stores a single permit when no task is waiting,
        // which is exactly the coalescing single-slot contract.
        self.notify.notify_one();
    }

    pub async fn wait(&self, cancel: &CancellationToken) -> WaitOutcome {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            _ = self.notify.notified() => WaitOutcome::Woken,
        }
    }
}
