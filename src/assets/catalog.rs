//! Whisper model metadata catalog.
//!
//! Static list of the whisper.cpp model builds subgen knows how to fetch,
//! with their published sizes and download URLs. Sizes are the human-readable
//! labels from the upstream distribution; exact byte counts are derived from
//! them when needed.

/// Metadata for a Whisper model build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny", "small-q5_1", "large-v3-turbo")
    pub name: &'static str,
    /// Published size label (e.g., "488 MB", "1.53 GB")
    pub size: &'static str,
    /// Download URL from HuggingFace
    pub url: &'static str,
    /// Human-readable display label
    pub label: &'static str,
}

/// A downloadable binary prerequisite: target file name, source URL, display
/// label, and the size it should have once on disk (when known).
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    pub file_name: String,
    pub url: String,
    pub label: String,
    pub declared_size: Option<u64>,
}

/// Catalog of available Whisper model builds.
///
/// Quantized variants (q5/q8) trade a little accuracy for much smaller
/// downloads and lower memory use.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        size: "77.7 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin?download=true",
        label: "Tiny",
    },
    ModelInfo {
        name: "tiny-q5_1",
        size: "32.2 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny-q5_1.bin?download=true",
        label: "Tiny (Q5_1 quantized)",
    },
    ModelInfo {
        name: "tiny-q8_0",
        size: "43.5 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny-q8_0.bin?download=true",
        label: "Tiny (Q8_0 quantized)",
    },
    ModelInfo {
        name: "small",
        size: "488 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin?download=true",
        label: "Small",
    },
    ModelInfo {
        name: "small-q5_1",
        size: "190 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small-q5_1.bin?download=true",
        label: "Small (Q5_1 quantized)",
    },
    ModelInfo {
        name: "small-q8_0",
        size: "264 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small-q8_0.bin?download=true",
        label: "Small (Q8_0 quantized)",
    },
    ModelInfo {
        name: "medium",
        size: "1.53 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin?download=true",
        label: "Medium",
    },
    ModelInfo {
        name: "medium-q5_0",
        size: "539 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium-q5_0.bin?download=true",
        label: "Medium (Q5_0 quantized)",
    },
    ModelInfo {
        name: "medium-q8_0",
        size: "823 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium-q8_0.bin?download=true",
        label: "Medium (Q8_0 quantized)",
    },
    ModelInfo {
        name: "large-v1",
        size: "3.09 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v1.bin?download=true",
        label: "Large v1",
    },
    ModelInfo {
        name: "large-v2",
        size: "3.09 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v2.bin?download=true",
        label: "Large v2",
    },
    ModelInfo {
        name: "large-v2-q5_0",
        size: "1.08 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v2-q5_0.bin?download=true",
        label: "Large v2 (Q5_0 quantized)",
    },
    ModelInfo {
        name: "large-v2-q8_0",
        size: "1.66 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v2-q8_0.bin?download=true",
        label: "Large v2 (Q8_0 quantized)",
    },
    ModelInfo {
        name: "large-v3",
        size: "3.1 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin?download=true",
        label: "Large v3",
    },
    ModelInfo {
        name: "large-v3-q5_0",
        size: "1.08 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-q5_0.bin?download=true",
        label: "Large v3 (Q5_0 quantized)",
    },
    ModelInfo {
        name: "large-v3-turbo",
        size: "1.62 GB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin?download=true",
        label: "Large v3 Turbo",
    },
    ModelInfo {
        name: "large-v3-turbo-q5_0",
        size: "574 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo-q5_0.bin?download=true",
        label: "Large v3 Turbo (Q5_0 quantized)",
    },
    ModelInfo {
        name: "large-v3-turbo-q8_0",
        size: "874 MB",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo-q8_0.bin?download=true",
        label: "Large v3 Turbo (Q8_0 quantized)",
    },
];

impl ModelInfo {
    /// Declared size in bytes, parsed from the published label.
    pub fn declared_size_bytes(&self) -> Option<u64> {
        parse_size_label(self.size)
    }

    /// Build the download descriptor for this model.
    pub fn descriptor(&self) -> AssetDescriptor {
        AssetDescriptor {
            file_name: model_file_name(self.name),
            url: self.url.to_string(),
            label: self.label.to_string(),
            declared_size: self.declared_size_bytes(),
        }
    }
}

/// Resolve convenience aliases to catalog names.
///
/// Unrecognized names pass through unchanged so callers get a proper
/// "unknown model" error with the name the user typed.
pub fn resolve_name(name: &str) -> &str {
    match name {
        "large" | "turbo" => "large-v3-turbo",
        other => other,
    }
}

/// Canonical on-disk file name for a model (after alias resolution).
pub fn model_file_name(name: &str) -> String {
    format!("ggml-{}.bin", resolve_name(name))
}

/// Find a model by name (after alias resolution).
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    let resolved = resolve_name(name);
    MODELS.iter().find(|m| m.name == resolved)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Parse a human-readable size label ("488 MB", "1.53 GB") to bytes.
///
/// Units are 1024-based, matching how the upstream labels were produced.
/// Fractional values truncate.
pub fn parse_size_label(label: &str) -> Option<u64> {
    let trimmed = label.trim();
    let (number_part, multiplier): (&str, f64) = if let Some(rest) = trimmed.strip_suffix("GB") {
        (rest, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(rest) = trimmed.strip_suffix("MB") {
        (rest, 1024.0 * 1024.0)
    } else if let Some(rest) = trimmed.strip_suffix("KB") {
        (rest, 1024.0)
    } else if let Some(rest) = trimmed.strip_suffix('B') {
        (rest, 1.0)
    } else {
        return None;
    };

    let value: f64 = number_part.trim().parse().ok()?;
    if value.is_sign_negative() {
        return None;
    }
    Some((value * multiplier) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_model_exists() {
        let model = get_model("small");
        assert!(model.is_some());
        let model = model.unwrap();
        assert_eq!(model.name, "small");
        assert_eq!(model.size, "488 MB");
    }

    #[test]
    fn test_get_model_not_found() {
        assert!(get_model("nonexistent").is_none());
    }

    #[test]
    fn test_get_model_resolves_aliases() {
        let model = get_model("large").unwrap();
        assert_eq!(model.name, "large-v3-turbo");
        let model = get_model("turbo").unwrap();
        assert_eq!(model.name, "large-v3-turbo");
    }

    #[test]
    fn test_list_models_count() {
        assert_eq!(list_models().len(), 18);
    }

    #[test]
    fn test_default_model_is_in_catalog() {
        let default = get_model(crate::defaults::DEFAULT_MODEL).unwrap();
        assert_eq!(default.name, crate::defaults::DEFAULT_MODEL);
    }

    #[test]
    fn test_all_models_have_valid_url() {
        for model in list_models() {
            assert!(
                model.url.starts_with("https://huggingface.co/"),
                "Model {} has unexpected URL: {}",
                model.name,
                model.url
            );
            assert!(
                model.url.contains(&format!("ggml-{}.bin", model.name)),
                "Model {} URL does not reference its file: {}",
                model.name,
                model.url
            );
        }
    }

    #[test]
    fn test_all_size_labels_parse() {
        for model in list_models() {
            assert!(
                model.declared_size_bytes().is_some(),
                "Model {} size label does not parse: {}",
                model.name,
                model.size
            );
        }
    }

    #[test]
    fn test_model_names_are_unique() {
        let names: Vec<_> = list_models().iter().map(|m| m.name).collect();
        let mut unique_names = names.clone();
        unique_names.sort_unstable();
        unique_names.dedup();
        assert_eq!(names.len(), unique_names.len());
    }

    #[test]
    fn test_quantized_variants_are_smaller() {
        let tiny = get_model("tiny").unwrap().declared_size_bytes().unwrap();
        let tiny_q5 = get_model("tiny-q5_1")
            .unwrap()
            .declared_size_bytes()
            .unwrap();
        assert!(tiny_q5 < tiny);

        let large_v3 = get_model("large-v3").unwrap().declared_size_bytes().unwrap();
        let large_v3_q5 = get_model("large-v3-q5_0")
            .unwrap()
            .declared_size_bytes()
            .unwrap();
        assert!(large_v3_q5 < large_v3);
    }

    #[test]
    fn test_model_file_name_format() {
        assert_eq!(model_file_name("small"), "ggml-small.bin");
        assert_eq!(model_file_name("large-v3-turbo-q8_0"), "ggml-large-v3-turbo-q8_0.bin");
        assert_eq!(model_file_name("large"), "ggml-large-v3-turbo.bin");
    }

    #[test]
    fn test_descriptor_carries_catalog_data() {
        let desc = get_model("small").unwrap().descriptor();
        assert_eq!(desc.file_name, "ggml-small.bin");
        assert_eq!(desc.declared_size, Some(488 * 1024 * 1024));
        assert!(desc.url.contains("ggml-small.bin"));
        assert_eq!(desc.label, "Small");
    }

    #[test]
    fn test_parse_size_label_whole_megabytes() {
        assert_eq!(parse_size_label("488 MB"), Some(488 * 1024 * 1024));
    }

    #[test]
    fn test_parse_size_label_fractional() {
        let bytes = parse_size_label("77.7 MB").unwrap();
        assert!(bytes > 77 * 1024 * 1024);
        assert!(bytes < 78 * 1024 * 1024);

        let bytes = parse_size_label("1.53 GB").unwrap();
        assert!(bytes > 1024 * 1024 * 1024);
        assert!(bytes < 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_label_small_units() {
        assert_eq!(parse_size_label("2 KB"), Some(2048));
        assert_eq!(parse_size_label("512 B"), Some(512));
    }

    #[test]
    fn test_parse_size_label_no_space() {
        // Labels without a separating space are still valid.
        assert_eq!(parse_size_label("488MB"), Some(488 * 1024 * 1024));
    }

    #[test]
    fn test_parse_size_label_rejects_garbage() {
        assert_eq!(parse_size_label("lots"), None);
        assert_eq!(parse_size_label(""), None);
        assert_eq!(parse_size_label("MB"), None);
        assert_eq!(parse_size_label("-5 MB"), None);
    }
}
