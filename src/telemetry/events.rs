use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) const TARGET: &str = "telemetry::playback";
pub(crate) const EVENT_ITEM: &str = "playback_item";
pub(crate) const EVENT_IDLE: &str = "queue_emptied";

#[derive(Debug, Serialize)]
pub struct PlaybackItemEvent {
    pub source: String,
    pub temporary: bool,
    pub outcome: &'static str,
    pub error: Option<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct QueueEmptiedEvent {
    pub items_played: u64,
}

pub fn record_item_outcome(
    source: &str,
    temporary: bool,
    outcome: &'static str,
    error: Option<&str>,
    latency: Duration,
) {
    let event = PlaybackItemEvent {
        source: source.to_string(),
        temporary,
        outcome,
        error: error.map(str::to_string),
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_ITEM,
            source = %event.source,
            temporary = event.temporary,
            outcome = event.outcome,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_ITEM,
            %err,
            "failed to encode playback item event"
        ),
    }
}

pub fn record_queue_emptied(items_played: u64) {
    let event = QueueEmptiedEvent { items_played };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_IDLE,
            items_played,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_IDLE,
            %err,
            "failed to encode queue emptied event"
        ),
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
