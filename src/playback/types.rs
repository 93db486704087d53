use serde::{Deserialize, Serialize};

/// 播放工作项：一个不可变的排队单元。
///
/// `source` 为绝对文件路径或绝对 URL；`temporary` 标记由引擎负责清理的
/// 临时文件（合成输出）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    source: String,
    temporary: bool,
}

impl WorkItem {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            temporary: false,
        }
    }

    /// 构造一个引擎在使用后必须删除其后备文件的工作项。
    pub fn temporary<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
            temporary: true,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Deletes the backing file of a temporary item. Deletion failures are
    /// swallowed: a missing or already-deleted temp file is not an
    /// operational error.
    pub(crate) fn discard_backing(&self) {
        if !self.temporary {
            return;
        }

        if let Err(err) = std::fs::remove_file(&self.source) {
            tracing::debug!(
                target: "playback_queue",
                %err,
                path = %self.source,
                "temp file cleanup skipped"
            );
        }
    }
}

/// 语音合成参数。越界的 `rate`/`volume` 由合成后端钳制，不会被拒绝。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub voice: Option<String>,
    pub rate: i32,
    pub volume: i32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            voice: None,
            rate: 0,
            volume: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Stopping,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        PlaybackStatus::Idle
    }
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Stopping => "stopping",
        }
    }
}

/// 一次播放尝试结束的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    Finished,
    Skipped,
    Shutdown,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionReason::Finished => "finished",
            CompletionReason::Skipped => "skipped",
            CompletionReason::Shutdown => "shutdown",
        }
    }
}

/// 引擎对外发布的生命周期事件。
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    ItemStarted {
        item: WorkItem,
    },
    ItemCompleted {
        item: WorkItem,
        reason: CompletionReason,
    },
    ItemFailed {
        item: WorkItem,
        error: String,
    },
    QueueEmptied,
}

/// 播放后端针对一次播放尝试发出的唯一终止通知。
#[derive(Debug, Clone)]
pub struct SinkNotice {
    pub item: WorkItem,
    pub outcome: SinkOutcome,
}

#[derive(Debug, Clone)]
pub enum SinkOutcome {
    Completed(CompletionReason),
    Errored(String),
}
