use std::f32::consts::TAU;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::playback::constants::TONE_SAMPLE_RATE;
use crate::playback::types::{PlaybackStatus, SinkNotice, SynthesisOptions, WorkItem};

/// Playback capability consumed by the orchestration loop.
///
/// A sink plays one item at a time and must send exactly one terminal
/// [`SinkNotice`] per play attempt on the channel handed to `initialize`,
/// even when `stop` races natural completion (first finalization wins,
/// the second is suppressed). The sink returns to `Idle` before sending
/// the notice.
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    async fn initialize(&self, notices: mpsc::Sender<SinkNotice>) -> Result<()>;

    /// Starts playback of `item`. An `Err` is a synchronous failure to
    /// start; no terminal notice follows.
    async fn play(&self, item: WorkItem) -> Result<()>;

    /// Requests a stop. Idempotent no-op when already `Idle`.
    async fn stop(&self) -> Result<()>;

    fn status(&self) -> PlaybackStatus;

    fn current_item(&self) -> Option<WorkItem>;
}

/// Synthesis capability: renders text into a playable audio file at a
/// unique path. The caller takes ownership of the file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize_to_file(
        &self,
        text: &str,
        options: &SynthesisOptions,
        cancel: &CancellationToken,
    ) -> Result<PathBuf>;
}

/// 内置的音调合成器：把文本确定性地渲染为一段短音调序列。
///
/// 没有平台语音可用时的回退实现。`rate` 缩放音块时长，`volume` 缩放振幅，
/// 越界值按规约钳制。
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self {
            sample_rate: TONE_SAMPLE_RATE,
        }
    }
}

impl ToneSynthesizer {
    fn word_frequency(word: &str) -> f32 {
        let sum: u32 = word.bytes().map(u32::from).sum();
        220.0 + (sum % 440) as f32
    }

    fn write_tone(
        &self,
        writer: &mut hound::WavWriter<std::io::BufWriter<std::fs::File>>,
        frequency: f32,
        duration_secs: f32,
        amplitude: f32,
    ) -> Result<()> {
        let samples = (self.sample_rate as f32 * duration_secs) as u32;
        for n in 0..samples {
            let t = n as f32 / self.sample_rate as f32;
            let value = (t * frequency * TAU).sin() * amplitude;
            writer
                .write_sample((value * i16::MAX as f32) as i16)
                .context("failed to write tone sample")?;
        }
        Ok(())
    }

    fn write_silence(
        &self,
        writer: &mut hound::WavWriter<std::io::BufWriter<std::fs::File>>,
        duration_secs: f32,
    ) -> Result<()> {
        let samples = (self.sample_rate as f32 * duration_secs) as u32;
        for _ in 0..samples {
            writer
                .write_sample(0_i16)
                .context("failed to write silence sample")?;
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn synthesize_to_file(
        &self,
        text: &str,
        options: &SynthesisOptions,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let rate = options.rate.clamp(-10, 10);
        let volume = options.volume.clamp(0, 100);

        // rate 10 halves block durations, rate -10 stretches them 1.5x.
        let tempo = 1.0 - rate as f32 * 0.05;
        let amplitude = volume as f32 / 100.0 * 0.8;

        let temp = tempfile::Builder::new()
            .prefix("cuebox-tts-")
            .suffix(".wav")
            .tempfile()
            .context("failed to create synthesis output file")?;
        let path = temp
            .into_temp_path()
            .keep()
            .context("failed to persist synthesis output file")?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)
            .context("failed to create wav writer for synthesis output")?;

        for word in text.split_whitespace() {
            if cancel.is_cancelled() {
                drop(writer);
                let _ = std::fs::remove_file(&path);
                bail!("synthesis cancelled");
            }

            self.write_tone(
                &mut writer,
                Self::word_frequency(word),
                0.12 * tempo,
                amplitude,
            )?;
            self.write_silence(&mut writer, 0.04 * tempo)?;
        }

        writer
            .finalize()
            .context("failed to finalize synthesis output")?;

        tracing::debug!(
            target: "tone_synthesizer",
            path = %path.display(),
            rate,
            volume,
            "rendered synthesis output"
        );

        Ok(path)
    }
}
