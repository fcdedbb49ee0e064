use crate::defaults;
use crate::error::{Result, SubgenError};
use std::sync::Arc;
use std::time::Duration;

/// One timestamped piece of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Per-run inference options.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Language code (e.g. "en", "de") or "auto" for detection.
    pub language: String,
    /// Sampling temperature in [0, 1].
    pub temperature: f32,
    /// Translate the output to English instead of transcribing.
    pub translate: bool,
    /// Text to bias decoding (names, jargon).
    pub prompt: Option<String>,
    /// Number of inference threads (None = engine default).
    pub threads: Option<usize>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            temperature: defaults::DEFAULT_TEMPERATURE,
            translate: false,
            prompt: None,
            threads: None,
        }
    }
}

/// Trait for speech-to-text transcription engines.
///
/// Segments are delivered through `on_segment` in decode order, as a lazy
/// forward-only stream. The callback returns `false` to stop the engine
/// early; already-delivered segments stand, and `transcribe` returns `Ok`.
///
/// This trait allows swapping implementations (real Whisper vs mock).
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples, streaming segments to `on_segment`.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    /// * `options` - Language, temperature and other per-run settings
    /// * `on_segment` - Receives each segment; return `false` to stop early
    fn transcribe(
        &self,
        audio: &[i16],
        options: &TranscribeOptions,
        on_segment: &mut (dyn FnMut(TranscriptSegment) -> bool + Send),
    ) -> Result<()>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across runs.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(
        &self,
        audio: &[i16],
        options: &TranscribeOptions,
        on_segment: &mut (dyn FnMut(TranscriptSegment) -> bool + Send),
    ) -> Result<()> {
        (**self).transcribe(audio, options, on_segment)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    model_name: String,
    segments: Vec<TranscriptSegment>,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with no segments
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            segments: Vec::new(),
            should_fail: false,
        }
    }

    /// Append a segment the mock will deliver (timestamps in milliseconds)
    pub fn with_segment(mut self, start_ms: u64, end_ms: u64, text: &str) -> Self {
        self.segments.push(TranscriptSegment::new(
            Duration::from_millis(start_ms),
            Duration::from_millis(end_ms),
            text,
        ));
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(
        &self,
        _audio: &[i16],
        _options: &TranscribeOptions,
        on_segment: &mut (dyn FnMut(TranscriptSegment) -> bool + Send),
    ) -> Result<()> {
        if self.should_fail {
            return Err(SubgenError::TranscriptionInferenceFailed {
                message: "mock transcription failure".to_string(),
            });
        }
        for segment in &self.segments {
            if !on_segment(segment.clone()) {
                break;
            }
        }
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
