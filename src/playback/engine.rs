use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::playback::config::PlaybackConfig;
use crate::playback::constants::SIMULATED_PLAY_DURATION;
use crate::playback::error::EnqueueError;
use crate::playback::queue::WorkQueue;
use crate::playback::runtime;
use crate::playback::signal::WakeSignal;
use crate::playback::traits::{PlaybackSink, SpeechSynthesizer, ToneSynthesizer};
use crate::playback::types::{
    CompletionReason, PlaybackEvent, PlaybackStatus, SinkNotice, SinkOutcome, SynthesisOptions,
    WorkItem,
};

/// 引擎门面：队列、唤醒信号、后端与编排循环的组装点。
///
/// 构造时启动唯一的后台编排任务；`shutdown` 按固定顺序拆除。
pub struct PlaybackEngine {
    config: PlaybackConfig,
    queue: Arc<WorkQueue>,
    wake: Arc<WakeSignal>,
    sink: Arc<dyn PlaybackSink>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    /// Builds an engine with the built-in fallback backends.
    pub async fn new(config: PlaybackConfig) -> Result<Self> {
        Self::with_backends(
            config,
            Arc::new(TimerSink::default()),
            Arc::new(ToneSynthesizer::default()),
        )
        .await
    }

    pub async fn with_backends(
        config: PlaybackConfig,
        sink: Arc<dyn PlaybackSink>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let (notice_tx, notice_rx) = mpsc::channel(config.notice_capacity);
        sink.initialize(notice_tx).await?;

        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let queue = Arc::new(WorkQueue::new());
        let wake = Arc::new(WakeSignal::new());
        let cancel = CancellationToken::new();

        let worker = runtime::spawn_worker(
            Arc::clone(&queue),
            Arc::clone(&wake),
            Arc::clone(&sink),
            notice_rx,
            event_tx.clone(),
            cancel.clone(),
        );

        info!(target: "playback_engine", "playback engine started");

        Ok(Self {
            config,
            queue,
            wake,
            sink,
            synthesizer,
            event_tx,
            cancel,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Appends a file item to the playback queue. Never fails; a missing
    /// file surfaces later as an `ItemFailed` event.
    pub fn enqueue_file<S: Into<String>>(&self, path: S) {
        let item = WorkItem::new(path);
        debug!(target: "playback_engine", source = %item.source(), "enqueued file");
        self.queue.enqueue(item);
        self.wake.raise();
    }

    /// Validates absolute-URL syntax before queueing; malformed input is
    /// rejected without touching the queue.
    pub fn enqueue_url(&self, url: &str) -> Result<(), EnqueueError> {
        let parsed = Url::parse(url).map_err(|err| EnqueueError::InvalidUrl {
            reason: err.to_string(),
        })?;

        let item = WorkItem::new(String::from(parsed));
        debug!(target: "playback_engine", source = %item.source(), "enqueued url");
        self.queue.enqueue(item);
        self.wake.raise();
        Ok(())
    }

    /// Synthesizes `text` on the caller's context (never inside the loop,
    /// so synthesis latency does not stall queued playback), then enqueues
    /// the resulting temporary item.
    pub async fn enqueue_synthesized(
        &self,
        text: &str,
        options: SynthesisOptions,
    ) -> Result<WorkItem, EnqueueError> {
        if text.trim().is_empty() {
            return Err(EnqueueError::EmptyText);
        }

        if self.cancel.is_cancelled() {
            return Err(EnqueueError::ShuttingDown);
        }

        let path = self
            .synthesizer
            .synthesize_to_file(text, &options, &self.cancel)
            .await
            .map_err(|err| EnqueueError::Synthesis(err.to_string()))?;

        let item = WorkItem::temporary(path.to_string_lossy());
        debug!(target: "playback_engine", source = %item.source(), "enqueued synthesized item");
        self.queue.enqueue(item.clone());
        self.wake.raise();
        Ok(item)
    }

    /// Requests a stop of the current item. No-op when idle.
    pub async fn skip_current(&self) -> Result<()> {
        if self.sink.status() == PlaybackStatus::Idle {
            debug!(target: "playback_engine", "skip requested while idle");
            return Ok(());
        }

        self.sink.stop().await
    }

    /// Purges pending items only; a currently playing item is untouched.
    pub fn clear_queue(&self) {
        self.queue.clear();
    }

    pub fn status(&self) -> PlaybackStatus {
        self.sink.status()
    }

    pub fn current_item(&self) -> Option<WorkItem> {
        self.sink.current_item()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }

    /// Tears the engine down: cancel, wake the loop, await its exit, stop
    /// the sink within the grace period, then purge the queue so never
    /// played temporary items are still cleaned up.
    pub async fn shutdown(&self) -> Result<()> {
        info!(target: "playback_engine", "shutting down");
        self.cancel.cancel();
        self.wake.raise();

        let worker = self.worker.lock().take();
        if let Some(mut handle) = worker {
            tokio::select! {
                _ = &mut handle => {}
                _ = sleep(self.config.shutdown_grace) => {
                    warn!(
                        target: "playback_engine",
                        "worker did not exit within grace period, aborting"
                    );
                    handle.abort();
                }
            }
        }

        if self.sink.status() != PlaybackStatus::Idle {
            match timeout(self.config.shutdown_grace, self.sink.stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(
                    target: "playback_engine",
                    %err,
                    "sink stop failed during teardown"
                ),
                Err(_) => warn!(
                    target: "playback_engine",
                    "sink stop timed out during teardown"
                ),
            }
        }

        self.queue.clear();
        info!(target: "playback_engine", "playback engine stopped");
        Ok(())
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }
    }
}

/// 内置的定时播放后端：按固定时长模拟渲染一个工作项。
///
/// 本地文件在 `play` 时做存在性检查，得到真实的同步启动失败路径；URL
/// 一律接受。自然结束与 `stop` 竞争时，按播放尝试上的原子标志裁决，
/// 先完成者胜出。
pub struct TimerSink {
    play_duration: Duration,
    shared: Arc<TimerSinkShared>,
}

struct TimerSinkShared {
    state: Mutex<TimerSinkState>,
    notices: Mutex<Option<mpsc::Sender<SinkNotice>>>,
}

#[derive(Default)]
struct TimerSinkState {
    status: PlaybackStatus,
    current: Option<WorkItem>,
    attempt: Option<Arc<PlayAttempt>>,
}

/// One play attempt; `finalized` is claimed with `swap`, so exactly one
/// of { timer expiry, stop request } delivers the terminal notice.
struct PlayAttempt {
    finalized: AtomicBool,
}

impl Default for TimerSink {
    fn default() -> Self {
        Self::new(SIMULATED_PLAY_DURATION)
    }
}

impl TimerSink {
    pub fn new(play_duration: Duration) -> Self {
        Self {
            play_duration,
            shared: Arc::new(TimerSinkShared {
                state: Mutex::new(TimerSinkState::default()),
                notices: Mutex::new(None),
            }),
        }
    }
}

impl TimerSinkShared {
    async fn finalize(&self, attempt: Arc<PlayAttempt>, item: WorkItem, outcome: SinkOutcome) {
        if attempt.finalized.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut state = self.state.lock();
            let owns_attempt = state
                .attempt
                .as_ref()
                .map_or(false, |current| Arc::ptr_eq(current, &attempt));
            if owns_attempt {
                state.status = PlaybackStatus::Idle;
                state.current = None;
                state.attempt = None;
            }
        }

        let notices = self.notices.lock().clone();
        if let Some(tx) = notices {
            if let Err(err) = tx.send(SinkNotice { item, outcome }).await {
                warn!(target: "timer_sink", %err, "failed to deliver terminal notice");
            }
        }
    }
}

#[async_trait]
impl PlaybackSink for TimerSink {
    async fn initialize(&self, notices: mpsc::Sender<SinkNotice>) -> Result<()> {
        *self.shared.notices.lock() = Some(notices);
        Ok(())
    }

    async fn play(&self, item: WorkItem) -> Result<()> {
        if self.shared.notices.lock().is_none() {
            bail!("sink is not initialised");
        }

        let is_url = item.source().contains("://");
        if !is_url && !Path::new(item.source()).exists() {
            bail!("missing audio file: {}", item.source());
        }

        let attempt = {
            let mut state = self.shared.state.lock();
            if state.status != PlaybackStatus::Idle {
                bail!("sink is busy");
            }

            let attempt = Arc::new(PlayAttempt {
                finalized: AtomicBool::new(false),
            });
            state.status = PlaybackStatus::Playing;
            state.current = Some(item.clone());
            state.attempt = Some(Arc::clone(&attempt));
            attempt
        };

        let shared = Arc::clone(&self.shared);
        let duration = self.play_duration;
        tokio::spawn(async move {
            sleep(duration).await;
            shared
                .finalize(
                    attempt,
                    item,
                    SinkOutcome::Completed(CompletionReason::Finished),
                )
                .await;
        });

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let stopping = {
            let mut state = self.shared.state.lock();
            match state.status {
                PlaybackStatus::Idle => None,
                _ => {
                    state.status = PlaybackStatus::Stopping;
                    match (state.attempt.clone(), state.current.clone()) {
                        (Some(attempt), Some(item)) => Some((attempt, item)),
                        _ => None,
                    }
                }
            }
        };

        if let Some((attempt, item)) = stopping {
            self.shared
                .finalize(
                    attempt,
                    item,
                    SinkOutcome::Completed(CompletionReason::Skipped),
                )
                .await;
        }

        Ok(())
    }

    fn status(&self) -> PlaybackStatus {
        self.shared.state.lock().status
    }

    fn current_item(&self) -> Option<WorkItem> {
        self.shared.state.lock().current.clone()
    }
}
