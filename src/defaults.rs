//! Default configuration constants for subgen.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Audio sample rate in Hz for extracted audio.
///
/// 16kHz is the standard input rate for Whisper models and provides a good
/// balance between quality and inference cost for speech.
pub const SAMPLE_RATE: u32 = 16000;

/// Channel count for extracted audio. Whisper expects mono input.
pub const AUDIO_CHANNELS: u16 = 1;

/// Default Whisper model name.
///
/// "small" is the smallest model that produces subtitles worth shipping.
/// Use a "large-v3" variant for better accuracy on difficult audio.
pub const DEFAULT_MODEL: &str = "small";

/// Default language code for transcription.
///
/// "auto" lets Whisper detect the spoken language automatically.
/// Set to a specific code (e.g., "en", "de") to force a language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default sampling temperature for inference. Zero is deterministic greedy
/// decoding, the right default for subtitles.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Size slack allowed when deciding whether an asset on disk matches its
/// declared size, in bytes.
///
/// Declared sizes come from human-readable labels ("1.53 GB"), so exact
/// comparison is impossible. 10 MiB of slack accepts rounding while still
/// catching truncated downloads.
pub const SIZE_TOLERANCE_BYTES: u64 = 10 * 1024 * 1024;

/// Minimum interval between download progress reports, in milliseconds.
pub const PROGRESS_INTERVAL_MS: u64 = 500;

/// File extension of the generated subtitle artifact.
pub const SUBTITLE_EXTENSION: &str = "srt";

/// File name of the audio-extraction binary.
#[cfg(windows)]
pub const EXTRACTOR_BINARY: &str = "ffmpeg.exe";

/// File name of the audio-extraction binary.
#[cfg(not(windows))]
pub const EXTRACTOR_BINARY: &str = "ffmpeg";

/// Download URL for a prebuilt extractor bundle.
///
/// Only Windows lacks a package manager to install ffmpeg from; the BtbN
/// builds are the ones the whisper.cpp ecosystem links to.
#[cfg(windows)]
pub const EXTRACTOR_ARCHIVE_URL: &str =
    "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip";

/// Archive entry suffix that identifies the extractor binary inside the bundle.
#[cfg(windows)]
pub const EXTRACTOR_ENTRY_SUFFIX: &str = "bin/ffmpeg.exe";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
