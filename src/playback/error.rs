use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("synthesis text cannot be empty")]
    EmptyText,
    #[error("invalid playback url: {reason}")]
    InvalidUrl { reason: String },
    #[error("engine is shutting down")]
    ShuttingDown,
    #[error("synthesis failed: {0}")]
    Synthesis(String),
}
