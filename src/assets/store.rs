//! On-disk locations for models and helper tools.
//!
//! Paths are parameterized on the base directory so configuration overrides
//! and tests can point anywhere; the `*_dir()` functions provide the
//! defaults under the user's cache directory.

use crate::assets::catalog::{ModelInfo, model_file_name};
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory where model files are stored.
///
/// Uses `~/.cache/subgen/models/` on Linux.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("subgen")
        .join("models")
}

/// Default directory for downloaded helper tools (the extractor bundle).
///
/// Uses `~/.cache/subgen/tools/` on Linux.
pub fn tools_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("subgen")
        .join("tools")
}

/// Full path of a model file inside `models_dir`.
///
/// Always returns a path regardless of whether the model is in the catalog.
/// The file may or may not exist on disk.
pub fn model_path(models_dir: &Path, name: &str) -> PathBuf {
    models_dir.join(model_file_name(name))
}

/// Check if a model's backing file is present.
pub fn is_model_installed(models_dir: &Path, name: &str) -> bool {
    model_path(models_dir, name).exists()
}

/// List installed model names by scanning `models_dir`.
///
/// Discovers every `ggml-*.bin` file, not just catalog models.
/// Returns model names (with the `ggml-` prefix and `.bin` suffix stripped),
/// sorted.
pub fn list_installed_models(models_dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(models_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let name = name.to_str()?;
            let model = name.strip_prefix("ggml-")?.strip_suffix(".bin")?;
            if entry.path().is_file() {
                Some(model.to_string())
            } else {
                None
            }
        })
        .collect();

    names.sort();
    names
}

/// Format model information for display.
pub fn format_model_info(models_dir: &Path, model: &ModelInfo) -> String {
    let status = if is_model_installed(models_dir, model.name) {
        "[installed]"
    } else {
        "[not installed]"
    };
    format!(
        "{:20} {:>8}   {:32} {}",
        model.name, model.size, model.label, status
    )
}
