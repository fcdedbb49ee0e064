//! Subtitle segment type and serialization.

pub mod srt;

use std::time::Duration;

/// One subtitle cue: a numbered, time-aligned piece of text.
///
/// Indices are 1-based and strictly increasing in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleSegment {
    pub index: u32,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl SubtitleSegment {
    pub fn new(index: u32, start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }
}
