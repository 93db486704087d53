mod worker;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::playback::queue::WorkQueue;
use crate::playback::signal::WakeSignal;
use crate::playback::traits::PlaybackSink;
use crate::playback::types::{PlaybackEvent, SinkNotice, WorkItem};

use self::worker::PlaybackWorker;

/// The single item the loop currently owns, held for the duration of one
/// play attempt.
pub(crate) struct InFlight {
    pub(crate) item: WorkItem,
    pub(crate) started: Instant,
}

pub(crate) fn spawn_worker(
    queue: Arc<WorkQueue>,
    wake: Arc<WakeSignal>,
    sink: Arc<dyn PlaybackSink>,
    notice_rx: mpsc::Receiver<SinkNotice>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    PlaybackWorker::new(queue, wake, sink, notice_rx, event_tx, cancel).spawn()
}
