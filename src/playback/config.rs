use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub notice_capacity: usize,
    pub event_capacity: usize,
    pub shutdown_grace: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            notice_capacity: 32,
            event_capacity: 64,
            shutdown_grace: Duration::from_millis(500),
        }
    }
}
