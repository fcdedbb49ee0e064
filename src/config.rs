use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::store;
use crate::defaults;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub stt: SttConfig,
    pub assets: AssetsConfig,
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    /// Catalog model name, e.g. "small" or "large-v3-turbo"
    pub model: String,
    /// ISO 639-1 language code, or "auto" to detect from the audio
    pub language: String,
    /// Sampling temperature; 0.0 always picks the most likely token
    pub temperature: f32,
    /// Translate the transcript to English instead of transcribing
    pub translate: bool,
    /// Initial prompt used to bias decoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Inference thread count; defaults to the available parallelism
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// Locations of downloaded models and tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AssetsConfig {
    /// Override for the model directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_dir: Option<PathBuf>,
    /// Override for the tool directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_dir: Option<PathBuf>,
    /// Existing audio extractor binary; skips the managed download
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor_path: Option<PathBuf>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            temperature: defaults::DEFAULT_TEMPERATURE,
            translate: false,
            prompt: None,
            threads: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SUBGEN_MODEL → stt.model
    /// - SUBGEN_LANGUAGE → stt.language
    /// - SUBGEN_FFMPEG → assets.extractor_path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SUBGEN_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("SUBGEN_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(extractor) = std::env::var("SUBGEN_FFMPEG")
            && !extractor.is_empty()
        {
            self.assets.extractor_path = Some(PathBuf::from(extractor));
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/subgen/config.toml on Linux
    pub fn default_path() -> PathBuf {
        // Every supported platform reports a config directory.
        #[allow(clippy::expect_used)]
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("subgen")
            .join("config.toml")
    }

    /// Directory holding transcription models, honoring the configured override
    pub fn models_dir(&self) -> PathBuf {
        self.assets
            .models_dir
            .clone()
            .unwrap_or_else(store::models_dir)
    }

    /// Directory holding managed tool binaries, honoring the configured override
    pub fn tools_dir(&self) -> PathBuf {
        self.assets
            .tools_dir
            .clone()
            .unwrap_or_else(store::tools_dir)
    }

    /// Persist a new default model, creating the file if necessary
    ///
    /// Other settings in an existing file are preserved.
    pub fn update_model(path: &Path, model: &str) -> anyhow::Result<()> {
        let mut config = match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    return Err(e);
                }
            }
        };
        config.stt.model = model.to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&config)?)?;
        Ok(())
    }
}
