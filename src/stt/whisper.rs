//! Whisper-based speech-to-text transcription.
//!
//! This module provides a Whisper implementation of the Transcriber trait using whisper-rs.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be installed.
//! To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::error::{Result, SubgenError};
use crate::stt::transcriber::{TranscribeOptions, Transcriber, TranscriptSegment};
use std::path::{Path, PathBuf};

#[cfg(feature = "whisper")]
use crate::defaults;
#[cfg(feature = "whisper")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "whisper")]
use std::sync::{Arc, Mutex, Once};
#[cfg(feature = "whisper")]
use std::time::Duration;
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, SegmentCallbackData, WhisperContext, WhisperContextParameters,
    install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Whisper-based transcriber implementation.
///
/// Uses whisper-rs for offline speech-to-text transcription. The
/// WhisperContext is wrapped in a Mutex, so concurrent `transcribe` calls
/// run one at a time.
///
/// # Feature Gate
///
/// This type is only available when the `whisper` feature is enabled.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    model_path: PathBuf,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper-based transcriber placeholder (without whisper feature).
///
/// This is a stub implementation that returns errors when used.
/// Enable the `whisper` feature to use real transcription.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    model_path: PathBuf,
    model_name: String,
}

fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    /// Create a new Whisper transcriber from a ggml model file.
    ///
    /// # Errors
    /// Returns `SubgenError::TranscriptionModelNotFound` if the model file doesn't exist
    /// Returns `SubgenError::TranscriptionInferenceFailed` if model loading fails
    pub fn new(model_path: &Path) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !model_path.exists() {
            return Err(SubgenError::TranscriptionModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(model_path);

        let mut context_params = WhisperContextParameters::default();
        // Fused attention kernels avoid the standalone softmax CUDA kernel,
        // which crashes on current-generation GPUs with older ggml.
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            model_path
                .to_str()
                .ok_or_else(|| SubgenError::TranscriptionInferenceFailed {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| SubgenError::TranscriptionInferenceFailed {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            model_path: model_path.to_path_buf(),
            model_name,
        })
    }

    /// Path of the loaded model file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
    /// Input is 16-bit PCM audio where samples range from -32768 to 32767.
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    /// Create a new Whisper transcriber (stub implementation).
    ///
    /// This returns an error indicating that the whisper feature is not enabled.
    pub fn new(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(SubgenError::TranscriptionModelNotFound {
                path: model_path.to_string_lossy().to_string(),
            });
        }

        Ok(Self {
            model_path: model_path.to_path_buf(),
            model_name: model_name_from_path(model_path),
        })
    }

    /// Path of the loaded model file.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// This function is available even without the whisper feature for testing.
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &self,
        audio: &[i16],
        options: &TranscribeOptions,
        on_segment: &mut (dyn FnMut(TranscriptSegment) -> bool + Send),
    ) -> Result<()> {
        let audio_f32 = Self::convert_audio(audio);

        // Lock the context for thread-safe access
        let context = self
            .context
            .lock()
            .map_err(|e| SubgenError::TranscriptionInferenceFailed {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        // Create a new state for this transcription
        let mut state =
            context
                .create_state()
                .map_err(|e| SubgenError::TranscriptionInferenceFailed {
                    message: format!("Failed to create Whisper state: {}", e),
                })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if options.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&options.language));
        }

        if let Some(threads) = options.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_temperature(options.temperature);
        params.set_translate(options.translate);

        if let Some(prompt) = &options.prompt
            && !prompt.is_empty()
        {
            params.set_initial_prompt(prompt);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Segments stream out of the decode loop as they are produced;
        // timestamps arrive in centiseconds. The sender lives inside the
        // params, so the channel closes when inference finishes.
        let (tx, rx) = std::sync::mpsc::channel::<TranscriptSegment>();
        params.set_segment_callback_safe_lossy(move |data: SegmentCallbackData| {
            tx.send(TranscriptSegment {
                start: Duration::from_millis(data.start_timestamp.max(0) as u64 * 10),
                end: Duration::from_millis(data.end_timestamp.max(0) as u64 * 10),
                text: data.text,
            })
            .ok();
        });

        let stop = Arc::new(AtomicBool::new(false));
        {
            let stop = Arc::clone(&stop);
            params.set_abort_callback_safe(move || stop.load(Ordering::SeqCst));
        }

        // Inference blocks this thread; a scoped thread drains the channel
        // so the caller sees segments while decoding is still running.
        let drain_stop = Arc::clone(&stop);
        let (inference_result, drain_result) = std::thread::scope(|scope| {
            let drain = scope.spawn(move || {
                for segment in rx {
                    if !on_segment(segment) {
                        drain_stop.store(true, Ordering::SeqCst);
                    }
                }
            });
            let inference_result = state.full(params, &audio_f32);
            (inference_result, drain.join())
        });

        if drain_result.is_err() {
            return Err(SubgenError::TranscriptionInferenceFailed {
                message: "Segment callback panicked".to_string(),
            });
        }

        match inference_result {
            Ok(_) => Ok(()),
            // A stop requested through the callback aborts whisper_full;
            // the partial output already streamed is the intended result.
            Err(_) if stop.load(Ordering::SeqCst) => Ok(()),
            Err(e) => Err(SubgenError::TranscriptionInferenceFailed {
                message: format!("Whisper inference failed: {}", e),
            }),
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        // The transcriber is ready if we successfully created it
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(
        &self,
        _audio: &[i16],
        _options: &TranscribeOptions,
        _on_segment: &mut (dyn FnMut(TranscriptSegment) -> bool + Send),
    ) -> Result<()> {
        Err(SubgenError::TranscriptionInferenceFailed {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
