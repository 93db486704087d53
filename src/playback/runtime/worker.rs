use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use tokio_util::sync::CancellationToken;

use crate::playback::constants::DRAIN_ERROR_BACKOFF;
use crate::playback::queue::WorkQueue;
use crate::playback::signal::{WaitOutcome, WakeSignal};
use crate::playback::traits::PlaybackSink;
use crate::playback::types::{
    CompletionReason, PlaybackEvent, PlaybackStatus, SinkNotice, SinkOutcome,
};
use crate::telemetry::events::{record_item_outcome, record_queue_emptied};

use super::InFlight;

pub(crate) struct PlaybackWorker {
    queue: Arc<WorkQueue>,
    wake: Arc<WakeSignal>,
    sink: Arc<dyn PlaybackSink>,
    notice_rx: mpsc::Receiver<SinkNotice>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
    in_flight: Option<InFlight>,
    idle_announced: bool,
    items_since_idle: u64,
}

impl PlaybackWorker {
    pub(crate) fn new(
        queue: Arc<WorkQueue>,
        wake: Arc<WakeSignal>,
        sink: Arc<dyn PlaybackSink>,
        notice_rx: mpsc::Receiver<SinkNotice>,
        event_tx: broadcast::Sender<PlaybackEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            wake,
            sink,
            notice_rx,
            event_tx,
            cancel,
            in_flight: None,
            // The engine starts empty and idle; that is not a transition.
            idle_announced: true,
            items_since_idle: 0,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        info!(target: "playback_worker", "playback worker started");
        let mut notice_closed = false;

        loop {
            tokio::select! {
                biased;

                maybe_notice = self.notice_rx.recv(), if !notice_closed => {
                    match maybe_notice {
                        Some(notice) => {
                            if let Err(err) = self.handle_notice(notice) {
                                self.recover(err).await;
                            }
                        }
                        None => {
                            notice_closed = true;
                        }
                    }
                }

                outcome = self.wake.wait(&self.cancel) => match outcome {
                    WaitOutcome::Cancelled => break,
                    WaitOutcome::Woken => {
                        if let Err(err) = self.drain_pass().await {
                            self.recover(err).await;
                        }
                    }
                }
            }
        }

        self.finalize();
    }

    /// Pulls items from the queue while the sink is idle. A synchronous
    /// failure to start advances to the next item without re-blocking on
    /// the wake signal.
    async fn drain_pass(&mut self) -> Result<()> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            if self.in_flight.is_some() || self.sink.status() != PlaybackStatus::Idle {
                return Ok(());
            }

            let Some(item) = self.queue.try_dequeue() else {
                self.maybe_announce_idle();
                return Ok(());
            };

            self.idle_announced = false;
            self.publish(PlaybackEvent::ItemStarted { item: item.clone() });
            let started = Instant::now();

            match self.sink.play(item.clone()).await {
                Ok(()) => {
                    debug!(
                        target: "playback_worker",
                        source = %item.source(),
                        "item playing"
                    );
                    self.in_flight = Some(InFlight { item, started });
                }
                Err(err) => {
                    warn!(
                        target: "playback_worker",
                        %err,
                        source = %item.source(),
                        "sink refused to start item"
                    );
                    self.publish(PlaybackEvent::ItemFailed {
                        item: item.clone(),
                        error: err.to_string(),
                    });
                    record_item_outcome(
                        item.source(),
                        item.is_temporary(),
                        "failed",
                        Some(&err.to_string()),
                        started.elapsed(),
                    );
                    item.discard_backing();
                    self.items_since_idle += 1;
                }
            }
        }
    }

    /// Handles the single terminal notice of a play attempt: publishes the
    /// lifecycle event, then discards temp storage (subscribers may still
    /// need the path while handling the event), then re-evaluates the
    /// queue.
    fn handle_notice(&mut self, notice: SinkNotice) -> Result<()> {
        let SinkNotice { item, outcome } = notice;

        let latency = match &self.in_flight {
            Some(current) if current.item == item => {
                let latency = current.started.elapsed();
                self.in_flight = None;
                latency
            }
            _ => {
                warn!(
                    target: "playback_worker",
                    source = %item.source(),
                    "terminal notice for an item the loop no longer tracks"
                );
                Duration::ZERO
            }
        };

        match outcome {
            SinkOutcome::Completed(reason) => {
                debug!(
                    target: "playback_worker",
                    source = %item.source(),
                    reason = reason.as_str(),
                    "item completed"
                );
                self.publish(PlaybackEvent::ItemCompleted {
                    item: item.clone(),
                    reason,
                });
                record_item_outcome(
                    item.source(),
                    item.is_temporary(),
                    reason.as_str(),
                    None,
                    latency,
                );
            }
            SinkOutcome::Errored(error) => {
                warn!(
                    target: "playback_worker",
                    source = %item.source(),
                    %error,
                    "item failed during playback"
                );
                self.publish(PlaybackEvent::ItemFailed {
                    item: item.clone(),
                    error: error.clone(),
                });
                record_item_outcome(
                    item.source(),
                    item.is_temporary(),
                    "failed",
                    Some(&error),
                    latency,
                );
            }
        }

        item.discard_backing();
        self.items_since_idle += 1;
        self.maybe_announce_idle();

        // Items may have arrived while the previous one was playing.
        self.wake.raise();
        Ok(())
    }

    fn maybe_announce_idle(&mut self) {
        if self.idle_announced || self.in_flight.is_some() {
            return;
        }

        if !self.queue.is_empty() || self.sink.status() != PlaybackStatus::Idle {
            return;
        }

        debug!(
            target: "playback_worker",
            items = self.items_since_idle,
            "queue emptied"
        );
        self.publish(PlaybackEvent::QueueEmptied);
        record_queue_emptied(self.items_since_idle);
        self.items_since_idle = 0;
        self.idle_announced = true;
    }

    /// Lifecycle events are observations: a send failure only means nobody
    /// is subscribed right now.
    fn publish(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            debug!(target: "playback_worker", "no event subscribers");
        }
    }

    async fn recover(&mut self, err: anyhow::Error) {
        error!(
            target: "playback_worker",
            %err,
            "orchestration fault, backing off"
        );
        sleep(DRAIN_ERROR_BACKOFF).await;
        self.wake.raise();
    }

    fn finalize(&mut self) {
        if let Some(InFlight { item, started }) = self.in_flight.take() {
            self.publish(PlaybackEvent::ItemCompleted {
                item: item.clone(),
                reason: CompletionReason::Shutdown,
            });
            record_item_outcome(
                item.source(),
                item.is_temporary(),
                CompletionReason::Shutdown.as_str(),
                None,
                started.elapsed(),
            );
            item.discard_backing();
        }

        info!(target: "playback_worker", "playback worker stopped");
    }
}
