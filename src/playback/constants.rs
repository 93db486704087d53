use std::time::Duration;

pub(crate) const DRAIN_ERROR_BACKOFF: Duration = Duration::from_millis(250);
pub(crate) const SIMULATED_PLAY_DURATION: Duration = Duration::from_millis(150);
pub(crate) const TONE_SAMPLE_RATE: u32 = 22_050;
