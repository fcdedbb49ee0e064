//! WAV reading for extracted audio.
//!
//! The extraction step always produces 16 kHz mono 16-bit PCM, so this
//! reader validates that format strictly instead of resampling.

use crate::defaults::{AUDIO_CHANNELS, SAMPLE_RATE};
use crate::error::{Result, SubgenError};
use std::path::Path;

/// Read all samples from a 16 kHz mono 16-bit PCM WAV file.
pub fn read_pcm16(path: &Path) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::open(path).map_err(|e| SubgenError::AudioDecode {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = reader.spec();
    if spec.sample_rate != SAMPLE_RATE
        || spec.channels != AUDIO_CHANNELS
        || spec.sample_format != hound::SampleFormat::Int
        || spec.bits_per_sample != 16
    {
        return Err(SubgenError::AudioDecode {
            message: format!(
                "Expected {} Hz mono 16-bit PCM, got {} Hz {}ch {}-bit {:?}",
                SAMPLE_RATE,
                spec.sample_rate,
                spec.channels,
                spec.bits_per_sample,
                spec.sample_format
            ),
        });
    }

    reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SubgenError::AudioDecode {
            message: format!("Failed to read WAV samples: {}", e),
        })
}
