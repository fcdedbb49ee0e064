//! Speech-to-text engine boundary.

pub mod transcriber;
pub mod whisper;
