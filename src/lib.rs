//! subgen - Offline subtitle generation for video and audio files
//!
//! Turns a media file into an SRT subtitle file: extracts a canonical PCM
//! track with ffmpeg, streams it through a Whisper model, and serializes
//! the timed segments as they arrive.

// Error handling: propagate with Result, no panics in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod stt;
pub mod subtitle;

// Core boundary traits
pub use pipeline::events::PipelineEvents;
pub use stt::transcriber::Transcriber;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, RunOutcome, RunRequest};
pub use pipeline::stage::PipelineStage;

// Error handling
pub use error::{Result, SubgenError};

// Config
pub use config::Config;

// Subtitle model
pub use subtitle::SubtitleSegment;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
