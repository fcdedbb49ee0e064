//! SubRip (SRT) serialization.
//!
//! Pure text assembly: no I/O, no failure modes. Writing the result to disk
//! is the caller's job.

use crate::subtitle::SubtitleSegment;
use std::time::Duration;

/// Format a duration as an SRT timecode: `HH:MM:SS,mmm`.
///
/// Hours are not wrapped at 24; a 25-hour timestamp renders as `25:…`,
/// which players accept and which keeps very long recordings unambiguous.
pub fn format_timecode(d: Duration) -> String {
    let total_ms = d.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Serialize ordered segments to SRT text.
///
/// Each segment becomes an index line, a `start --> end` timecode line, the
/// text, and a trailing blank line. Empty input yields an empty string.
pub fn serialize(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            seg.index,
            format_timecode(seg.start),
            format_timecode(seg.end),
            seg.text
        ));
    }
    out
}
