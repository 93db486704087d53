mod playback;
mod telemetry;

use anyhow::Result;
use playback::{PlaybackConfig, PlaybackEngine};
use telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let engine = PlaybackEngine::new(PlaybackConfig::default()).await?;
    tokio::signal::ctrl_c().await?;
    engine.shutdown().await
}
