//! 播放编排服务。

mod constants;
mod engine;
mod runtime;

pub mod config;
pub mod error;
pub mod queue;
pub mod signal;
pub mod traits;
pub mod types;

pub use config::PlaybackConfig;
pub use engine::{PlaybackEngine, TimerSink};
pub use error::EnqueueError;
pub use queue::WorkQueue;
pub use signal::{WaitOutcome, WakeSignal};
pub use traits::{PlaybackSink, SpeechSynthesizer, ToneSynthesizer};
pub use types::{
    CompletionReason, PlaybackEvent, PlaybackStatus, SinkNotice, SinkOutcome, SynthesisOptions,
    WorkItem,
};

#[cfg(test)]
mod tests;
