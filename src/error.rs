//! Error types for subgen.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubgenError {
    // Input validation errors
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    #[error("Unknown model '{name}'. Run `subgen models list` to see available models")]
    UnknownModel { name: String },

    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Run lifecycle
    #[error("A transcription run is already in progress")]
    PipelineBusy,

    #[error("Operation cancelled")]
    Cancelled,

    // Asset acquisition errors
    #[error("Download of {asset} failed with status {status}")]
    AssetHttpStatus { asset: String, status: String },

    #[error("Download of {asset} failed: {message}")]
    AssetDownload { asset: String, message: String },

    #[error("Archive {archive} contains no entry matching '{entry}'")]
    ArchiveEntryMissing { archive: String, entry: String },

    #[error("Audio extractor not available: {message}")]
    ExtractorNotFound { message: String },

    // Extraction tool errors
    #[error("Failed to launch {tool}: {message}")]
    ToolLaunch { tool: String, message: String },

    #[error("{tool} exited with code {code}: {diagnostics}")]
    ToolFailed {
        tool: String,
        code: i32,
        diagnostics: String,
    },

    // Audio decode errors
    #[error("Audio decode error: {message}")]
    AudioDecode { message: String },

    // Inference errors
    #[error("Transcription inference failed: {message}")]
    TranscriptionInferenceFailed { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SubgenError>;
