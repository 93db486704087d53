//! Cuebox Core Library
//!
//! This crate provides the core functionality for the Cuebox playback
//! service: the work queue, the orchestration loop that serializes audio
//! work items into a single playback stream, the pluggable playback and
//! synthesis backends, and telemetry.

pub mod playback;
pub mod telemetry;
