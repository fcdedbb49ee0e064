//! Subtitle generation pipeline.
//!
//! One sequential run per media file: validate, ensure the extraction tool,
//! probe duration, extract audio, transcribe, assemble SRT. Stages share a
//! cancellation scope and report through [`PipelineEvents`].

pub mod driver;
pub mod events;
pub mod orchestrator;
pub mod stage;

pub use driver::TranscriptOutcome;
pub use events::{MemoryEvents, NullEvents, PipelineEvents};
pub use orchestrator::{Pipeline, RunOutcome, RunRequest};
pub use stage::PipelineStage;
